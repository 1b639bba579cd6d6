//! Feature alignment: turning a sparse [`PredictionInput`] into the exact
//! vector layout a loaded model expects.

use std::collections::HashMap;

use ndarray::Array1;

use crate::artifacts::ModelBundle;
use crate::error::{AlignmentError, DuplicateFeature};
use crate::input::PredictionInput;

/// Number of inputs taken, in supplied order, when the bundle carries no
/// feature names.
pub const FALLBACK_FEATURE_COUNT: usize = 10;

/// Ordered numeric input for a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Array1<f64>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        FeatureVector(Array1::zeros(len))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.0
    }

    pub fn into_inner(self) -> Array1<f64> {
        self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        FeatureVector(Array1::from_vec(values))
    }
}

impl From<Array1<f64>> for FeatureVector {
    fn from(values: Array1<f64>) -> Self {
        FeatureVector(values)
    }
}

/// The feature names a model was trained on, with a name -> position table
/// built once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureLayout {
    pub fn new(names: Vec<String>) -> Result<Self, DuplicateFeature> {
        let mut positions = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), index).is_some() {
                return Err(DuplicateFeature(name.clone()));
            }
        }
        Ok(FeatureLayout { names, positions })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-sensitive, exact-match lookup.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Places every known input at its trained position; everything else
    /// stays zero. Unknown names are dropped.
    pub fn arrange(&self, input: &PredictionInput) -> FeatureVector {
        let mut values = Array1::zeros(self.names.len());
        for (name, value) in input.iter() {
            if let Some(index) = self.position(name) {
                values[index] = value;
            }
        }
        FeatureVector(values)
    }
}

/// Builds the vector for one prediction request.
///
/// Without a feature layout the first [`FALLBACK_FEATURE_COUNT`] inputs are
/// used as-is. Shorter inputs are not padded, so a model expecting exactly
/// ten features will reject them at inference time.
///
/// A bundled scaler is applied last and its output returned unchanged.
pub fn align(input: &PredictionInput, bundle: &ModelBundle) -> Result<FeatureVector, AlignmentError> {
    if bundle.model().is_none() {
        return Err(AlignmentError::ModelUnavailable(bundle.status().to_string()));
    }

    let vector = match bundle.feature_layout() {
        Some(layout) => layout.arrange(input),
        None => FeatureVector::from(
            input
                .values()
                .take(FALLBACK_FEATURE_COUNT)
                .collect::<Vec<f64>>(),
        ),
    };

    Ok(match bundle.scaler() {
        Some(scaler) => scaler.transform(vector),
        None => vector,
    })
}
