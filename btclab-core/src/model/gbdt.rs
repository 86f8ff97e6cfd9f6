//! Gradient-boosted ensemble over regression trees.
//!
//! Squared-loss boosting: the model starts from the target mean and
//! each round fits one tree to the current residuals. Leaf values are
//! already learning-rate scaled, so prediction is `init + Σ tree(x)`.

use super::tree::{SplitSpec, Tree};
use super::GbtParams;

/// A fitted forecasting model.
#[derive(Debug, Clone, PartialEq)]
pub struct GbtModel {
    init: f64,
    trees: Vec<Tree>,
    feature_names: Vec<String>,
}

impl GbtModel {
    /// Fit on row-major training data. `targets` must be non-empty and
    /// row-aligned with `data`; the trainer enforces both.
    pub fn fit(
        data: &[Vec<f64>],
        targets: &[f64],
        feature_names: Vec<String>,
        params: &GbtParams,
    ) -> Self {
        debug_assert_eq!(data.len(), targets.len());
        debug_assert!(!targets.is_empty());

        let n = targets.len();
        let init = targets.iter().sum::<f64>() / n as f64;
        let spec: SplitSpec = params.split_spec();

        let mut preds = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            for i in 0..n {
                residuals[i] = targets[i] - preds[i];
            }
            let tree = Tree::fit(data, &residuals, &spec);
            for (pred, row) in preds.iter_mut().zip(data) {
                *pred += tree.predict_row(row);
            }
            trees.push(tree);
        }

        Self {
            init,
            trees,
            feature_names,
        }
    }

    /// Predict one feature row, ordered like [`Self::feature_names`].
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        debug_assert_eq!(row.len(), self.feature_names.len());
        self.init + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    /// Expected model output over the training distribution; the base
    /// value that attributions are measured against.
    pub fn base_value(&self) -> f64 {
        self.init + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }
}
