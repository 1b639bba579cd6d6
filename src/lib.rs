//! Student dropout risk prediction.
//!
//! Loads an exported classifier once at startup ([`artifacts`]), lines up
//! caller-supplied student attributes with the model's feature layout
//! ([`features`]) and serves risk predictions over HTTP ([`api`]).

pub mod api;
pub mod artifacts;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod input;
pub mod model;
pub mod predictor;
pub mod risk;
pub mod student;

pub use artifacts::{ArtifactPaths, ArtifactResolver, BundleStatus, ModelBundle};
pub use error::{AlignmentError, InferenceError, PredictError};
pub use features::{align, FeatureLayout, FeatureVector, FALLBACK_FEATURE_COUNT};
pub use input::PredictionInput;
pub use predictor::{predict, PredictionOutcome};
pub use risk::RiskLevel;
