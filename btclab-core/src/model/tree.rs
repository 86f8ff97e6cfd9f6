//! Regression trees for gradient boosting.
//!
//! One flat-arena tree type serves both backends; they differ only in
//! how leaves are grown. Depthwise growth expands every node level by
//! level up to a depth cap. Leafwise growth keeps a priority queue of
//! candidate splits and always takes the highest-gain leaf next, up to
//! a leaf cap.
//!
//! Splits are exact greedy over midpoint thresholds. For squared loss
//! the score of a node holding residuals `r` is `(Σr)² / (n + λ)` and
//! a split's gain is `score(L) + score(R) − score(parent)`; the leaf
//! weight is `Σr / (n + λ)`. Everything is deterministic: features are
//! scanned in order, ties keep the first candidate, and the leafwise
//! queue breaks equal gains by node id.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Gains at or below this are noise from the prefix sums, not splits.
const MIN_GAIN: f64 = 1e-12;

/// How a tree is grown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    Depthwise { max_depth: usize },
    Leafwise { max_leaves: usize },
}

/// Full growth recipe for one tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitSpec {
    pub growth: Growth,
    pub lambda: f64,
    pub min_leaf: usize,
    /// Learning rate, baked into leaf values at fit time.
    pub scale: f64,
}

/// One arena node. `feature`/`threshold`/children are meaningful only
/// when `is_leaf` is false; `value` only when it is true. `cover` is
/// the number of training rows that reached the node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    pub value: f64,
    pub cover: f64,
    pub is_leaf: bool,
}

impl TreeNode {
    fn leaf(value: f64, cover: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
            cover,
            is_leaf: true,
        }
    }
}

/// A fitted regression tree over a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Fit a tree to `residuals` over row-major `data`.
    pub fn fit(data: &[Vec<f64>], residuals: &[f64], spec: &SplitSpec) -> Self {
        debug_assert_eq!(data.len(), residuals.len());
        let rows: Vec<usize> = (0..data.len()).collect();
        let mut builder = Builder {
            data,
            residuals,
            spec,
            nodes: Vec::new(),
        };
        match spec.growth {
            Growth::Depthwise { max_depth } => {
                builder.grow_depthwise(rows, 0, max_depth);
            }
            Growth::Leafwise { max_leaves } => {
                builder.grow_leafwise(rows, max_leaves);
            }
        }
        Self {
            nodes: builder.nodes,
        }
    }

    /// Route a feature row to its leaf value.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.value;
            }
            idx = if row[node.feature] <= node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }

    /// Cover-weighted mean leaf value: the tree's output expectation
    /// over its training distribution.
    pub fn expected_value(&self) -> f64 {
        let root_cover = self.nodes[0].cover;
        self.nodes
            .iter()
            .filter(|n| n.is_leaf)
            .map(|n| n.value * n.cover)
            .sum::<f64>()
            / root_cover
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }
}

struct Builder<'a> {
    data: &'a [Vec<f64>],
    residuals: &'a [f64],
    spec: &'a SplitSpec,
    nodes: Vec<TreeNode>,
}

/// Winning split for one node. Rows are re-partitioned by predicate
/// when the split is applied, so only the routing rule is stored.
#[derive(Debug, Clone, Copy)]
struct BestSplit {
    gain: f64,
    feature: usize,
    threshold: f64,
}

impl Builder<'_> {
    fn node_sum(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&r| self.residuals[r]).sum()
    }

    fn leaf_value(&self, sum: f64, count: f64) -> f64 {
        self.spec.scale * sum / (count + self.spec.lambda)
    }

    fn push_leaf(&mut self, rows: &[usize]) -> usize {
        let sum = self.node_sum(rows);
        let value = self.leaf_value(sum, rows.len() as f64);
        self.nodes.push(TreeNode::leaf(value, rows.len() as f64));
        self.nodes.len() - 1
    }

    fn grow_depthwise(&mut self, rows: Vec<usize>, depth: usize, max_depth: usize) -> usize {
        let split = if depth < max_depth {
            self.best_split(&rows)
        } else {
            None
        };
        let Some(split) = split else {
            return self.push_leaf(&rows);
        };

        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: 0.0,
            cover: rows.len() as f64,
            is_leaf: false,
        });
        let (left_rows, right_rows) = self.partition(rows, split.feature, split.threshold);
        let left = self.grow_depthwise(left_rows, depth + 1, max_depth);
        let right = self.grow_depthwise(right_rows, depth + 1, max_depth);
        self.nodes[id].left = left;
        self.nodes[id].right = right;
        id
    }

    fn grow_leafwise(&mut self, rows: Vec<usize>, max_leaves: usize) {
        let root_split = self.best_split(&rows);
        let root = self.push_leaf(&rows);
        debug_assert_eq!(root, 0);

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        if let Some(split) = root_split {
            heap.push(Candidate {
                split,
                node: root,
                rows,
            });
        }

        let mut leaves = 1;
        while leaves < max_leaves {
            let Some(cand) = heap.pop() else {
                break;
            };
            let (left_rows, right_rows) =
                self.partition(cand.rows, cand.split.feature, cand.split.threshold);

            let left = self.push_leaf(&left_rows);
            let right = self.push_leaf(&right_rows);
            let node = &mut self.nodes[cand.node];
            node.feature = cand.split.feature;
            node.threshold = cand.split.threshold;
            node.left = left;
            node.right = right;
            node.value = 0.0;
            node.is_leaf = false;
            leaves += 1;

            if let Some(split) = self.best_split(&left_rows) {
                heap.push(Candidate {
                    split,
                    node: left,
                    rows: left_rows,
                });
            }
            if let Some(split) = self.best_split(&right_rows) {
                heap.push(Candidate {
                    split,
                    node: right,
                    rows: right_rows,
                });
            }
        }
    }

    /// Exact greedy scan over every feature. Returns None when no
    /// split clears `min_leaf` on both sides with positive gain.
    fn best_split(&self, rows: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        if n < 2 || n < 2 * self.spec.min_leaf {
            return None;
        }
        let lambda = self.spec.lambda;
        let parent_sum = self.node_sum(rows);
        let parent_score = score(parent_sum, n as f64, lambda);
        let n_features = self.data[rows[0]].len();

        let mut best: Option<BestSplit> = None;
        let mut order = rows.to_vec();
        for feature in 0..n_features {
            order.copy_from_slice(rows);
            order.sort_by(|&a, &b| self.data[a][feature].total_cmp(&self.data[b][feature]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.residuals[order[k - 1]];
                let prev = self.data[order[k - 1]][feature];
                let next = self.data[order[k]][feature];
                if prev == next {
                    continue;
                }
                if k < self.spec.min_leaf || n - k < self.spec.min_leaf {
                    continue;
                }

                let right_sum = parent_sum - left_sum;
                let gain = score(left_sum, k as f64, lambda)
                    + score(right_sum, (n - k) as f64, lambda)
                    - parent_score;
                if gain <= MIN_GAIN {
                    continue;
                }
                if best.map_or(true, |b| gain > b.gain) {
                    // midpoint of adjacent floats can round up to `next`;
                    // fall back to prev so `x <= threshold` splits cleanly
                    let mut threshold = 0.5 * (prev + next);
                    if threshold >= next {
                        threshold = prev;
                    }
                    best = Some(BestSplit {
                        gain,
                        feature,
                        threshold,
                    });
                }
            }
        }
        best
    }

    fn partition(
        &self,
        rows: Vec<usize>,
        feature: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        rows.into_iter()
            .partition(|&r| self.data[r][feature] <= threshold)
    }
}

fn score(sum: f64, count: f64, lambda: f64) -> f64 {
    sum * sum / (count + lambda)
}

/// Heap entry for leafwise growth: max gain first, smaller node id on
/// equal gain.
struct Candidate {
    split: BestSplit,
    node: usize,
    rows: Vec<usize>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .gain
            .total_cmp(&other.split.gain)
            .then_with(|| other.node.cmp(&self.node))
    }
}
