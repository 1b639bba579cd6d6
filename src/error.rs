use std::io;

use thiserror::Error;

use crate::artifacts::BundleStatus;

/// Failure while reading or decoding a model artifact.
///
/// Never escapes the resolver: a not-found read steers the fallback chain,
/// anything else becomes `BundleStatus::LoadError`.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact {path}: {reason}")]
    Invalid { path: String, reason: String },
}

impl ArtifactError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArtifactError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Alignment was attempted against a bundle that holds no model.
#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("cannot align features: no model loaded (status: {0})")]
    ModelUnavailable(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum InferenceError {
    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("feature vector contains a non-finite value at position {0}")]
    NonFinite(usize),

    #[error("model score overflowed to a non-finite value")]
    NonFiniteScore,

    #[error("model returned no class probabilities")]
    EmptyProbabilities,
}

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("model not available ({0})")]
    ModelUnavailable(BundleStatus),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Rejected caller input, raised before a `PredictionInput` is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("unrecognised yes/no value {0:?}")]
    InvalidFlag(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("unsupported value for {field}: {value}")]
    Unsupported { field: String, value: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("batch has no header row")]
    MissingHeader,

    #[error("batch contains no rows")]
    Empty,
}

#[derive(Debug, Error, PartialEq)]
#[error("duplicate feature name {0:?}")]
pub struct DuplicateFeature(pub String);
