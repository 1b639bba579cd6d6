//! Model artifact resolution.
//!
//! Artifacts are looked up in priority order:
//!
//! 1. a combined bundle holding the model, feature names, metrics and an
//!    optional scaler ([`BundleStatus::Complete`]);
//! 2. a standalone model file plus an optional scaler file
//!    ([`BundleStatus::Basic`]);
//! 3. nothing ([`BundleStatus::NotFound`]).
//!
//! Only a missing file moves resolution to the next step. Any other failure
//! (unreadable file, malformed JSON, missing required key) stops resolution
//! with [`BundleStatus::LoadError`], so a broken bundle is never masked by an
//! older standalone model.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::features::FeatureLayout;
use crate::model::{Classifier, ModelArtifact, Scaler, ScalerArtifact};

pub const DEFAULT_BUNDLE_FILE: &str = "model_artifacts_complete.json";
pub const DEFAULT_MODEL_FILE: &str = "dropout_prediction_model.json";
pub const DEFAULT_SCALER_FILE: &str = "feature_scaler.json";

/// Metrics every combined bundle must report.
pub const REQUIRED_METRICS: [&str; 2] = ["accuracy", "f1_score"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BundleStatus {
    Complete,
    Basic,
    NotFound,
    LoadError(String),
}

impl BundleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BundleStatus::Complete => "complete",
            BundleStatus::Basic => "basic",
            BundleStatus::NotFound => "not_found",
            BundleStatus::LoadError(_) => "error",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BundleStatus::Complete | BundleStatus::Basic)
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleStatus::LoadError(detail) => write!(f, "error: {}", detail),
            other => f.write_str(other.label()),
        }
    }
}

/// Metric name to value, as reported by the training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceMetrics(BTreeMap<String, f64>);

impl PerformanceMetrics {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.get("accuracy")
    }

    pub fn f1_score(&self) -> Option<f64> {
        self.get("f1_score")
    }

    /// Cross-validation mean, reported only when positive.
    pub fn cross_val_mean(&self) -> Option<f64> {
        self.get("cross_val_mean").filter(|value| *value > 0.0)
    }

    pub fn cross_val_std(&self) -> Option<f64> {
        self.get("cross_val_std").filter(|value| *value > 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PerformanceMetrics {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        PerformanceMetrics(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    #[serde(default, deserialize_with = "whole_count")]
    pub training_samples: Option<u64>,
    #[serde(default, deserialize_with = "whole_count")]
    pub features_count: Option<u64>,
    #[serde(default)]
    pub training_date: Option<String>,
}

/// Counts written by numpy/pandas often arrive as floats (`3539.0`).
fn whole_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Integer(u64),
        Float(f64),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Integer(count)) => Ok(Some(count)),
        Some(Count::Float(value))
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 =>
        {
            Ok(Some(value as u64))
        }
        Some(Count::Float(value)) => Err(de::Error::custom(format!(
            "expected a non-negative whole number, found {}",
            value
        ))),
    }
}

/// Everything the resolver found, plus how it found it.
///
/// A model is present exactly when the status is `Complete` or `Basic`; the
/// constructors are the only way to build one.
#[derive(Debug)]
pub struct ModelBundle {
    model: Option<Box<dyn Classifier>>,
    scaler: Option<Box<dyn Scaler>>,
    layout: Option<FeatureLayout>,
    performance_metrics: Option<PerformanceMetrics>,
    training_info: Option<TrainingInfo>,
    model_name: Option<String>,
    status: BundleStatus,
}

impl ModelBundle {
    pub fn complete(
        model: Box<dyn Classifier>,
        scaler: Option<Box<dyn Scaler>>,
        layout: FeatureLayout,
        performance_metrics: PerformanceMetrics,
    ) -> Self {
        Self {
            model: Some(model),
            scaler,
            layout: Some(layout),
            performance_metrics: Some(performance_metrics),
            training_info: None,
            model_name: None,
            status: BundleStatus::Complete,
        }
    }

    pub fn basic(model: Box<dyn Classifier>, scaler: Option<Box<dyn Scaler>>) -> Self {
        Self {
            model: Some(model),
            scaler,
            layout: None,
            performance_metrics: None,
            training_info: None,
            model_name: None,
            status: BundleStatus::Basic,
        }
    }

    pub fn not_found() -> Self {
        Self::empty(BundleStatus::NotFound)
    }

    pub fn load_error(detail: impl Into<String>) -> Self {
        Self::empty(BundleStatus::LoadError(detail.into()))
    }

    fn empty(status: BundleStatus) -> Self {
        Self {
            model: None,
            scaler: None,
            layout: None,
            performance_metrics: None,
            training_info: None,
            model_name: None,
            status,
        }
    }

    pub fn with_training_info(mut self, training_info: Option<TrainingInfo>) -> Self {
        if self.status == BundleStatus::Complete {
            self.training_info = training_info;
        }
        self
    }

    pub fn with_model_name(mut self, model_name: Option<String>) -> Self {
        if self.status == BundleStatus::Complete {
            self.model_name = model_name;
        }
        self
    }

    pub fn status(&self) -> &BundleStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&dyn Classifier> {
        self.model.as_deref()
    }

    pub fn scaler(&self) -> Option<&dyn Scaler> {
        self.scaler.as_deref()
    }

    pub fn feature_layout(&self) -> Option<&FeatureLayout> {
        self.layout.as_ref()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.layout.as_ref().map(FeatureLayout::names)
    }

    pub fn performance_metrics(&self) -> Option<&PerformanceMetrics> {
        self.performance_metrics.as_ref()
    }

    pub fn training_info(&self) -> Option<&TrainingInfo> {
        self.training_info.as_ref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }
}

/// On-disk shape of the combined bundle.
#[derive(Debug, Deserialize)]
struct BundleFile {
    model: ModelArtifact,
    feature_names: Vec<String>,
    performance_metrics: PerformanceMetrics,
    #[serde(default)]
    scaler: Option<ScalerArtifact>,
    #[serde(default)]
    training_info: Option<TrainingInfo>,
    #[serde(default)]
    model_name: Option<String>,
}

impl BundleFile {
    fn into_bundle(self, path: &Path) -> Result<ModelBundle, ArtifactError> {
        let invalid = |reason: String| ArtifactError::Invalid {
            path: path.display().to_string(),
            reason,
        };

        self.model.validate().map_err(invalid)?;
        for metric in REQUIRED_METRICS {
            if self.performance_metrics.get(metric).is_none() {
                return Err(invalid(format!("performance_metrics is missing {:?}", metric)));
            }
        }

        if let Some(scaler) = &self.scaler {
            scaler.validate().map_err(invalid)?;
        }

        // A width disagreement is left to surface per request at inference.
        let n_features = self.feature_names.len();
        if self.model.n_features() != n_features {
            log::warn!(
                "{}: model expects {} features but feature_names lists {}",
                path.display(),
                self.model.n_features(),
                n_features
            );
        }

        let layout = FeatureLayout::new(self.feature_names).map_err(|err| invalid(err.to_string()))?;

        Ok(ModelBundle::complete(
            self.model.into_classifier(),
            self.scaler.map(ScalerArtifact::into_scaler),
            layout,
            self.performance_metrics,
        )
        .with_training_info(self.training_info)
        .with_model_name(self.model_name))
    }
}

/// Where the resolver looks for each artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub bundle: PathBuf,
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            bundle: dir.join(DEFAULT_BUNDLE_FILE),
            model: dir.join(DEFAULT_MODEL_FILE),
            scaler: dir.join(DEFAULT_SCALER_FILE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    paths: ArtifactPaths,
}

impl ArtifactResolver {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Runs [`resolve`](Self::resolve) on tokio's blocking thread pool.
    pub async fn resolve_blocking(self) -> ModelBundle {
        match tokio::task::spawn_blocking(move || self.resolve()).await {
            Ok(bundle) => bundle,
            Err(err) => {
                log::error!("Artifact loading task failed: {}", err);
                ModelBundle::load_error(format!("artifact loading task failed: {}", err))
            }
        }
    }

    /// Resolves the artifacts. Reads the filesystem and nothing else, so the
    /// result can be computed once and shared for the life of the process.
    pub fn resolve(&self) -> ModelBundle {
        let bundle = match self.try_resolve() {
            Ok(Some(bundle)) => bundle,
            Ok(None) => ModelBundle::not_found(),
            Err(err) => ModelBundle::load_error(err.to_string()),
        };

        match bundle.status() {
            BundleStatus::Complete => log::info!(
                "Loaded complete model bundle from {} ({} features)",
                self.paths.bundle.display(),
                bundle.feature_names().map_or(0, <[String]>::len)
            ),
            BundleStatus::Basic => log::info!(
                "Loaded basic model from {} (scaler: {})",
                self.paths.model.display(),
                if bundle.scaler().is_some() { "yes" } else { "no" }
            ),
            BundleStatus::NotFound => log::warn!(
                "No model artifacts found (looked for {} and {})",
                self.paths.bundle.display(),
                self.paths.model.display()
            ),
            BundleStatus::LoadError(detail) => log::error!("Failed to load model artifacts: {}", detail),
        }

        bundle
    }

    fn try_resolve(&self) -> Result<Option<ModelBundle>, ArtifactError> {
        match self.load_complete() {
            Ok(bundle) => return Ok(Some(bundle)),
            Err(err) if err.is_not_found() => {
                log::debug!("{} not found, trying standalone model", self.paths.bundle.display());
            }
            Err(err) => return Err(err),
        }

        match self.load_basic() {
            Ok(bundle) => Ok(Some(bundle)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn load_complete(&self) -> Result<ModelBundle, ArtifactError> {
        let file: BundleFile = read_json(&self.paths.bundle)?;
        file.into_bundle(&self.paths.bundle)
    }

    fn load_basic(&self) -> Result<ModelBundle, ArtifactError> {
        let model: ModelArtifact = read_json(&self.paths.model)?;
        model.validate().map_err(|reason| ArtifactError::Invalid {
            path: self.paths.model.display().to_string(),
            reason,
        })?;

        let scaler = match self.load_scaler() {
            Ok(scaler) => Some(scaler),
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                log::warn!("Ignoring unusable scaler: {}", err);
                None
            }
        };

        Ok(ModelBundle::basic(model.into_classifier(), scaler))
    }

    fn load_scaler(&self) -> Result<Box<dyn Scaler>, ArtifactError> {
        let scaler: ScalerArtifact = read_json(&self.paths.scaler)?;
        scaler.validate().map_err(|reason| ArtifactError::Invalid {
            path: self.paths.scaler.display().to_string(),
            reason,
        })?;
        Ok(scaler.into_scaler())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })
}
