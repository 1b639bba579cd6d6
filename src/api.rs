use actix_web::http::StatusCode;
use actix_web::{error, web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::artifacts::{BundleStatus, ModelBundle, PerformanceMetrics, TrainingInfo};
use crate::data::parse_batch;
use crate::error::{AlignmentError, DataError, InferenceError, InputError, PredictError};
use crate::input::PredictionInput;
use crate::predictor::{self, PredictionOutcome};
use crate::risk::RiskLevel;
use crate::student::StudentForm;

/// The bundle resolved at startup, shared read-only by every worker.
pub type SharedBundle = web::Data<ModelBundle>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("model not available: {0}")]
    Unavailable(BundleStatus),

    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("invalid batch: {0}")]
    Data(#[from] DataError),

    #[error("{0}")]
    Inference(InferenceError),

    #[error("{0}")]
    Alignment(AlignmentError),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::ModelUnavailable(status) => ApiError::Unavailable(status),
            PredictError::Alignment(err) => ApiError::Alignment(err),
            PredictError::Inference(err) => ApiError::Inference(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Input(_) | ApiError::Data(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Alignment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub ready: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub status: &'static str,
    pub model_name: Option<String>,
    pub feature_count: Option<usize>,
    pub feature_names: Option<Vec<String>>,
    pub has_scaler: bool,
    pub performance_metrics: Option<PerformanceMetrics>,
    pub training_info: Option<TrainingInfo>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub dropout_risk: f64,
    pub risk_level: RiskLevel,
    pub headline: &'static str,
    pub message: &'static str,
    pub action: &'static str,
    pub recommendations: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_factors: Option<Vec<&'static str>>,
    pub generated_at: DateTime<Utc>,
}

impl From<PredictionOutcome> for PredictResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        let level = outcome.risk_level;
        PredictResponse {
            prediction: outcome.prediction,
            dropout_risk: outcome.dropout_risk,
            risk_level: level,
            headline: level.headline(),
            message: level.message(),
            action: level.action(),
            recommendations: level.recommendations().to_vec(),
            risk_factors: None,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchPrediction {
    pub row: usize,
    pub name: Option<String>,
    pub prediction: Option<i64>,
    pub dropout_risk: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub recommendation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub avg_dropout_risk: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub predictions: Vec<BatchPrediction>,
    pub summary: BatchSummary,
}

fn ensure_ready(bundle: &ModelBundle) -> Result<(), ApiError> {
    if bundle.is_ready() {
        Ok(())
    } else {
        Err(ApiError::Unavailable(bundle.status().clone()))
    }
}

fn run_prediction(bundle: &ModelBundle, input: &PredictionInput) -> Result<PredictionOutcome, ApiError> {
    predictor::predict(bundle, input).map_err(|err| {
        log::warn!("Prediction failed: {}", err);
        ApiError::from(err)
    })
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Dropout Risk API is running!")
}

async fn model_status(bundle: SharedBundle) -> HttpResponse {
    let status = bundle.status();
    let message = match status {
        BundleStatus::Complete => "Complete Model Loaded".to_string(),
        BundleStatus::Basic => "Basic Model Loaded".to_string(),
        BundleStatus::NotFound => "Model Not Found".to_string(),
        BundleStatus::LoadError(detail) => format!("Error: {}", detail),
    };
    let detail = match status {
        BundleStatus::LoadError(detail) => Some(detail.clone()),
        _ => None,
    };

    HttpResponse::Ok().json(StatusResponse {
        status: status.label(),
        ready: bundle.is_ready(),
        message,
        detail,
    })
}

async fn model_info(bundle: SharedBundle) -> Result<HttpResponse, ApiError> {
    ensure_ready(&bundle)?;

    Ok(HttpResponse::Ok().json(ModelInfoResponse {
        status: bundle.status().label(),
        model_name: bundle.model_name().map(str::to_string),
        feature_count: bundle
            .feature_names()
            .map(<[String]>::len)
            .or_else(|| bundle.model().and_then(|model| model.n_features())),
        feature_names: bundle.feature_names().map(<[String]>::to_vec),
        has_scaler: bundle.scaler().is_some(),
        performance_metrics: bundle.performance_metrics().cloned(),
        training_info: bundle.training_info().cloned(),
    }))
}

async fn predict(
    input: web::Json<PredictionInput>,
    bundle: SharedBundle,
) -> Result<HttpResponse, ApiError> {
    let outcome = run_prediction(&bundle, &input)?;
    Ok(HttpResponse::Ok().json(PredictResponse::from(outcome)))
}

async fn predict_student(
    form: web::Json<StudentForm>,
    bundle: SharedBundle,
) -> Result<HttpResponse, ApiError> {
    ensure_ready(&bundle)?;
    let input = form.to_input()?;
    let outcome = run_prediction(&bundle, &input)?;

    let mut response = PredictResponse::from(outcome);
    response.risk_factors = Some(form.risk_factors());
    Ok(HttpResponse::Ok().json(response))
}

async fn batch_predict(body: String, bundle: SharedBundle) -> Result<HttpResponse, ApiError> {
    ensure_ready(&bundle)?;
    let rows = parse_batch(&body)?;

    let mut predictions = Vec::with_capacity(rows.len());
    let mut summary = BatchSummary::default();
    let mut total_risk = 0.0;

    for row in rows {
        let result = row
            .input
            .map_err(ApiError::from)
            .and_then(|input| run_prediction(&bundle, &input));

        let prediction = match result {
            Ok(outcome) => {
                summary.succeeded += 1;
                total_risk += outcome.dropout_risk;
                match outcome.risk_level {
                    RiskLevel::High => summary.high_risk += 1,
                    RiskLevel::Medium => summary.medium_risk += 1,
                    RiskLevel::Low => summary.low_risk += 1,
                }
                BatchPrediction {
                    row: row.row,
                    name: row.label,
                    prediction: Some(outcome.prediction),
                    dropout_risk: Some(outcome.dropout_risk),
                    risk_level: Some(outcome.risk_level),
                    recommendation: Some(outcome.risk_level.action()),
                    error: None,
                }
            }
            Err(err) => {
                summary.failed += 1;
                BatchPrediction {
                    row: row.row,
                    name: row.label,
                    prediction: None,
                    dropout_risk: None,
                    risk_level: None,
                    recommendation: None,
                    error: Some(err.to_string()),
                }
            }
        };
        predictions.push(prediction);
    }

    if summary.succeeded > 0 {
        summary.avg_dropout_risk = total_risk / summary.succeeded as f64;
    }

    Ok(HttpResponse::Ok().json(BatchResult {
        total: predictions.len(),
        predictions,
        summary,
    }))
}

/// JSON body errors answer with the same `{"error": ...}` shape as handlers.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody {
            error: err.to_string(),
        };
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .route("/model/status", web::get().to(model_status))
        .route("/model/info", web::get().to(model_info))
        .route("/predict", web::post().to(predict))
        .route("/predict/student", web::post().to(predict_student))
        .route("/batch-predict", web::post().to(batch_predict));
}
