//! Exact per-tree SHAP attribution.
//!
//! Polynomial-time TreeSHAP: walk every root-to-leaf path once while
//! carrying, for each feature on the path, the fraction of subsets
//! that flow through ("zero fraction", from training covers) and
//! whether the instance itself does ("one fraction"). The path weights
//! summarize all feature subsets of the prefix, so each leaf adds its
//! exact Shapley contribution for every feature on its path.

use crate::model::Tree;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// Splitting feature, -1 for the phantom root element.
    feature: i32,
    /// Cover ratio surviving this split when its feature is excluded.
    zero_fraction: f64,
    /// 1.0 while the instance follows this path, 0.0 once it departs.
    one_fraction: f64,
    /// Permutation weight of the subset sizes summarized so far.
    pweight: f64,
}

/// Accumulate one tree's attributions for `x` into `phi`.
pub(crate) fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    recurse(tree, x, phi, 0, &[], 1.0, 1.0, -1);
}

fn recurse(
    tree: &Tree,
    x: &[f64],
    phi: &mut [f64],
    node_id: usize,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: i32,
) {
    // each level works on its own copy; unwinds never leak upward
    let mut path = parent_path.to_vec();
    extend(&mut path, zero_fraction, one_fraction, feature);
    let depth = path.len() - 1;
    let node = &tree.nodes()[node_id];

    if node.is_leaf {
        for i in 1..=depth {
            let w = unwound_sum(&path, depth, i);
            let el = path[i];
            phi[el.feature as usize] += w * (el.one_fraction - el.zero_fraction) * node.value;
        }
        return;
    }

    let (hot, cold) = if x[node.feature] <= node.threshold {
        (node.left, node.right)
    } else {
        (node.right, node.left)
    };
    let hot_ratio = tree.nodes()[hot].cover / node.cover;
    let cold_ratio = tree.nodes()[cold].cover / node.cover;

    // a feature met twice on one path keeps a single combined element
    let mut incoming_zero = 1.0;
    let mut incoming_one = 1.0;
    if let Some(k) = (1..=depth).find(|&i| path[i].feature == node.feature as i32) {
        incoming_zero = path[k].zero_fraction;
        incoming_one = path[k].one_fraction;
        unwind(&mut path, k);
    }

    recurse(
        tree,
        x,
        phi,
        hot,
        &path,
        incoming_zero * hot_ratio,
        incoming_one,
        node.feature as i32,
    );
    recurse(
        tree,
        x,
        phi,
        cold,
        &path,
        incoming_zero * cold_ratio,
        0.0,
        node.feature as i32,
    );
}

/// Grow the path by one split, reweighting every prefix subset size.
fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: i32) {
    let d = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if d == 0 { 1.0 } else { 0.0 },
    });
    let df = d as f64;
    for i in (0..d).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i as f64 + 1.0) / (df + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (df - i as f64) / (df + 1.0);
    }
}

/// Remove element `index` from the path, restoring the weights that
/// extension with it produced.
fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let df = depth as f64;

    let mut next_one_portion = path[depth].pweight;
    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (df + 1.0) / ((i as f64 + 1.0) * one);
            next_one_portion = tmp - path[i].pweight * zero * (df - i as f64) / (df + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (df + 1.0) / (zero * (df - i as f64));
        }
    }
    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight the path would have if element `index`
/// were unwound, without mutating the path.
fn unwound_sum(path: &[PathElement], depth: usize, index: usize) -> f64 {
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let df = depth as f64;

    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;
    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * (df + 1.0) / ((i as f64 + 1.0) * one);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero * ((df - i as f64) / (df + 1.0));
        } else {
            total += (path[i].pweight / zero) / ((df - i as f64) / (df + 1.0));
        }
    }
    total
}
