//! Additive attribution of forecasts.
//!
//! Every prediction decomposes exactly as `base value + Σ per-feature
//! contribution`: the base value is the model's expected output over
//! its training distribution, and the contributions are Shapley values
//! computed per tree and summed across the ensemble.

mod tree_shap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::GbtModel;
use tree_shap::tree_shap;

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("attribution expects {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
}

/// One feature's share of a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureContribution {
    pub feature: String,
    /// The input value the model saw.
    pub value: f64,
    /// Signed contribution to the prediction.
    pub phi: f64,
}

/// Exact additive decomposition of one prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribution {
    pub base_value: f64,
    pub prediction: f64,
    /// Per-feature contributions, in model feature order.
    pub contributions: Vec<FeatureContribution>,
}

impl Attribution {
    /// `base + Σ phi`; reproduces the prediction up to float noise.
    pub fn reconstructed(&self) -> f64 {
        self.base_value + self.contributions.iter().map(|c| c.phi).sum::<f64>()
    }

    /// Contributions by descending magnitude; name breaks exact ties.
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut out: Vec<&FeatureContribution> = self.contributions.iter().collect();
        out.sort_by(|a, b| {
            b.phi
                .abs()
                .total_cmp(&a.phi.abs())
                .then_with(|| a.feature.cmp(&b.feature))
        });
        out
    }
}

/// Attribution engine over a fitted ensemble.
pub struct TreeExplainer<'a> {
    model: &'a GbtModel,
}

impl<'a> TreeExplainer<'a> {
    pub fn new(model: &'a GbtModel) -> Self {
        Self { model }
    }

    /// Explain one feature row, ordered like the model's features.
    pub fn explain(&self, x: &[f64]) -> Result<Attribution, ExplainError> {
        let expected = self.model.feature_names().len();
        if x.len() != expected {
            return Err(ExplainError::FeatureMismatch {
                expected,
                got: x.len(),
            });
        }

        let mut phi = vec![0.0; expected];
        for tree in self.model.trees() {
            tree_shap(tree, x, &mut phi);
        }

        let contributions = self
            .model
            .feature_names()
            .iter()
            .zip(x)
            .zip(&phi)
            .map(|((name, value), phi)| FeatureContribution {
                feature: name.clone(),
                value: *value,
                phi: *phi,
            })
            .collect();

        Ok(Attribution {
            base_value: self.model.base_value(),
            prediction: self.model.predict_row(x),
            contributions,
        })
    }
}
