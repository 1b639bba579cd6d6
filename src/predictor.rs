use serde::Serialize;

use crate::artifacts::ModelBundle;
use crate::error::{InferenceError, PredictError};
use crate::features::align;
use crate::input::PredictionInput;
use crate::risk::RiskLevel;

/// Result of one successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub prediction: i64,
    pub probabilities: Vec<f64>,
    pub dropout_risk: f64,
    pub risk_level: RiskLevel,
}

/// Picks the dropout probability out of a model's class probabilities:
/// the second entry for a two-class output, otherwise the only one.
pub fn dropout_risk(probabilities: &[f64]) -> Result<f64, InferenceError> {
    match probabilities {
        [] => Err(InferenceError::EmptyProbabilities),
        [only] => Ok(*only),
        [_, positive, ..] => Ok(*positive),
    }
}

/// Runs align, predict and banding against a shared, read-only bundle.
///
/// Errors belong to the single request; the bundle is never touched.
pub fn predict(bundle: &ModelBundle, input: &PredictionInput) -> Result<PredictionOutcome, PredictError> {
    let model = match bundle.model() {
        Some(model) => model,
        None => return Err(PredictError::ModelUnavailable(bundle.status().clone())),
    };

    let features = align(input, bundle)?;
    let prediction = model.predict(&features)?;
    let probabilities = model.predict_probability(&features)?;
    let risk = dropout_risk(&probabilities)?;

    Ok(PredictionOutcome {
        prediction,
        probabilities,
        dropout_risk: risk,
        risk_level: RiskLevel::from_risk(risk),
    })
}
