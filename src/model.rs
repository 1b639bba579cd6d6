use std::fmt;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::features::FeatureVector;

/// A trained binary classifier.
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Input width the model was trained on, if it records one.
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError>;

    /// Class probabilities ordered like the model's classes.
    fn predict_probability(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError>;
}

/// A fitted preprocessing transform applied before inference.
pub trait Scaler: fmt::Debug + Send + Sync {
    fn n_features(&self) -> usize;

    /// Positions without fitted parameters pass through unchanged.
    fn transform(&self, features: FeatureVector) -> FeatureVector;
}

/// Serialized model, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticModel),
}

impl ModelArtifact {
    pub fn n_features(&self) -> usize {
        match self {
            ModelArtifact::LogisticRegression(model) => model.coefficients.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModelArtifact::LogisticRegression(model) => model.validate(),
        }
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelArtifact::LogisticRegression(model) => Box::new(model),
        }
    }
}

/// Serialized scaler, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerArtifact {
    pub fn n_features(&self) -> usize {
        match self {
            ScalerArtifact::Standard(scaler) => scaler.mean.len(),
            ScalerArtifact::MinMax(scaler) => scaler.min.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (left, right, what) = match self {
            ScalerArtifact::Standard(scaler) => (&scaler.mean, &scaler.scale, "mean/scale"),
            ScalerArtifact::MinMax(scaler) => (&scaler.min, &scaler.scale, "min/scale"),
        };
        if left.len() != right.len() {
            return Err(format!(
                "scaler {} lengths differ ({} vs {})",
                what,
                left.len(),
                right.len()
            ));
        }
        if left.iter().chain(right.iter()).any(|value| !value.is_finite()) {
            return Err("scaler parameters must be finite".to_string());
        }
        Ok(())
    }

    pub fn into_scaler(self) -> Box<dyn Scaler> {
        match self {
            ScalerArtifact::Standard(scaler) => Box::new(scaler),
            ScalerArtifact::MinMax(scaler) => Box::new(scaler),
        }
    }
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

fn default_threshold() -> f64 {
    0.5
}

/// Binary logistic regression: `p = sigmoid(w . x + b)` is the probability
/// of `classes[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            classes: default_classes(),
            threshold: default_threshold(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("logistic model has no coefficients".to_string());
        }
        if let Some(index) = self.coefficients.iter().position(|w| !w.is_finite()) {
            return Err(format!("coefficient {} is not finite", index));
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".to_string());
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold {} outside [0, 1]", self.threshold));
        }
        Ok(())
    }

    fn positive_probability(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        if features.len() != self.coefficients.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        if let Some(index) = features.iter().position(|value| !value.is_finite()) {
            return Err(InferenceError::NonFinite(index));
        }

        let weights = ArrayView1::from(self.coefficients.as_slice());
        let z = weights.dot(features.values()) + self.intercept;
        if !z.is_finite() {
            return Err(InferenceError::NonFiniteScore);
        }
        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        let p = self.positive_probability(features)?;
        Ok(if p >= self.threshold { self.classes[1] } else { self.classes[0] })
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        let p = self.positive_probability(features)?;
        Ok(vec![1.0 - p, p])
    }
}

/// Standardization: `(x - mean) / scale`. A zero scale leaves the centred
/// value unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: FeatureVector) -> FeatureVector {
        let mut values = features.into_inner();
        for (value, (mean, scale)) in values.iter_mut().zip(self.mean.iter().zip(&self.scale)) {
            let scale = if *scale == 0.0 { 1.0 } else { *scale };
            *value = (*value - mean) / scale;
        }
        FeatureVector::from(values)
    }
}

/// Min-max scaling as stored by scikit-learn: `x * scale + min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new(min: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { min, scale }
    }
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, features: FeatureVector) -> FeatureVector {
        let mut values = features.into_inner();
        for (value, (min, scale)) in values.iter_mut().zip(self.min.iter().zip(&self.scale)) {
            *value = *value * scale + min;
        }
        FeatureVector::from(values)
    }
}
