//! Forecast model: backend presets, boosting, training, prediction.

pub mod gbdt;
pub mod predict;
pub mod trainer;
pub mod tree;

pub use gbdt::GbtModel;
pub use predict::{predict_latest, Forecast, PredictError};
pub use trainer::{train, TrainError, TrainOutput, MAX_HORIZON, MIN_HORIZON};
pub use tree::{Growth, SplitSpec, Tree, TreeNode};

use serde::{Deserialize, Serialize};

/// Depthwise preset: shallow balanced trees, L2-regularized leaves.
pub const DEPTHWISE_MAX_DEPTH: usize = 3;
pub const DEPTHWISE_LAMBDA: f64 = 1.0;
pub const DEPTHWISE_MIN_LEAF: usize = 1;

/// Leafwise preset: best-first growth to a leaf cap, unregularized.
pub const LEAFWISE_MAX_LEAVES: usize = 31;
pub const LEAFWISE_LAMBDA: f64 = 0.0;
pub const LEAFWISE_MIN_LEAF: usize = 3;

pub const DEFAULT_N_TREES: usize = 100;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Tree-growth backend. Both fit the same boosting loop; swapping one
/// for the other changes only how individual trees take shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Backend {
    Depthwise,
    Leafwise,
}

/// Boosting hyperparameters.
///
/// There is no seed: split finding is exact greedy with ordered
/// feature scans and total-order tie-breaks, so refits are bit-stable
/// without one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GbtParams {
    pub backend: Backend,
    pub n_trees: usize,
    pub learning_rate: f64,
}

impl Default for GbtParams {
    fn default() -> Self {
        Self {
            backend: Backend::Depthwise,
            n_trees: DEFAULT_N_TREES,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl GbtParams {
    pub(crate) fn split_spec(&self) -> SplitSpec {
        match self.backend {
            Backend::Depthwise => SplitSpec {
                growth: Growth::Depthwise {
                    max_depth: DEPTHWISE_MAX_DEPTH,
                },
                lambda: DEPTHWISE_LAMBDA,
                min_leaf: DEPTHWISE_MIN_LEAF,
                scale: self.learning_rate,
            },
            Backend::Leafwise => SplitSpec {
                growth: Growth::Leafwise {
                    max_leaves: LEAFWISE_MAX_LEAVES,
                },
                lambda: LEAFWISE_LAMBDA,
                min_leaf: LEAFWISE_MIN_LEAF,
                scale: self.learning_rate,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Backend::Depthwise).unwrap(),
            "\"DEPTHWISE\""
        );
        let parsed: Backend = serde_json::from_str("\"LEAFWISE\"").unwrap();
        assert_eq!(parsed, Backend::Leafwise);
    }

    #[test]
    fn default_params_match_presets() {
        let params = GbtParams::default();
        assert_eq!(params.backend, Backend::Depthwise);
        assert_eq!(params.n_trees, 100);
        assert_eq!(params.learning_rate, 0.1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let params: GbtParams = serde_json::from_str(r#"{"backend": "LEAFWISE"}"#).unwrap();
        assert_eq!(params.backend, Backend::Leafwise);
        assert_eq!(params.n_trees, DEFAULT_N_TREES);
    }
}
