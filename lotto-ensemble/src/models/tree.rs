use rand::prelude::*;
use rand::rngs::StdRng;

/// Paramètres de croissance d'un arbre de Gini.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_leaf: usize,
    /// None : toutes les features sont candidates à chaque nœud.
    pub features_per_split: Option<usize>,
    /// Gain d'impureté minimal pour accepter une coupure.
    pub min_gain: f64,
}

#[derive(Debug)]
pub enum TreeNode {
    Leaf { value: f64 },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split { feature_idx, threshold, left, right } => {
                let v = features.get(*feature_idx).copied().unwrap_or(0.0);
                if v <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Feuille = fréquence des étiquettes positives.
pub fn build_tree(
    features: &[&[f64]],
    labels: &[f64],
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    build_node(features, labels, params.max_depth, params, rng)
}

fn leaf(labels: &[f64]) -> TreeNode {
    TreeNode::Leaf {
        value: labels.iter().sum::<f64>() / labels.len().max(1) as f64,
    }
}

fn build_node(
    features: &[&[f64]],
    labels: &[f64],
    depth_left: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    let min_leaf = params.min_leaf.max(1);
    if depth_left == 0 || labels.len() < 2 * min_leaf {
        return leaf(labels);
    }

    // Nœud pur
    let first = labels[0];
    if labels.iter().all(|&l| (l - first).abs() < 1e-10) {
        return TreeNode::Leaf { value: first };
    }

    let n_features = features[0].len();
    let mut feature_indices: Vec<usize> = (0..n_features).collect();
    if let Some(k) = params.features_per_split {
        feature_indices.shuffle(rng);
        feature_indices.truncate(k.max(1));
    }

    let mut best_gini = f64::MAX;
    let mut best_feature = 0;
    let mut best_threshold = 0.0;

    for &feat_idx in &feature_indices {
        let mut values: Vec<f64> = features.iter().map(|f| f[feat_idx]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        if values.len() < 2 {
            continue;
        }

        // Échantillonnage des seuils pour les features à nombreuses valeurs
        let step = (values.len() / 32).max(1);
        for i in (0..values.len() - 1).step_by(step) {
            let threshold = (values[i] + values[i + 1]) / 2.0;
            let gini = split_gini(features, labels, feat_idx, threshold, min_leaf);

            if gini < best_gini {
                best_gini = gini;
                best_feature = feat_idx;
                best_threshold = threshold;
            }
        }
    }

    if best_gini == f64::MAX || gini_impurity(labels) - best_gini <= params.min_gain {
        return leaf(labels);
    }

    let mut left_features = Vec::new();
    let mut left_labels = Vec::new();
    let mut right_features = Vec::new();
    let mut right_labels = Vec::new();

    for (i, feat) in features.iter().enumerate() {
        if feat[best_feature] <= best_threshold {
            left_features.push(*feat);
            left_labels.push(labels[i]);
        } else {
            right_features.push(*feat);
            right_labels.push(labels[i]);
        }
    }

    TreeNode::Split {
        feature_idx: best_feature,
        threshold: best_threshold,
        left: Box::new(build_node(&left_features, &left_labels, depth_left - 1, params, rng)),
        right: Box::new(build_node(&right_features, &right_labels, depth_left - 1, params, rng)),
    }
}

fn gini_impurity(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let n = labels.len() as f64;
    let p = labels.iter().sum::<f64>() / n;
    2.0 * p * (1.0 - p)
}

fn split_gini(features: &[&[f64]], labels: &[f64], feature_idx: usize, threshold: f64, min_leaf: usize) -> f64 {
    let (mut n_left, mut pos_left) = (0usize, 0.0f64);
    let (mut n_right, mut pos_right) = (0usize, 0.0f64);

    for (i, feat) in features.iter().enumerate() {
        if feat[feature_idx] <= threshold {
            n_left += 1;
            pos_left += labels[i];
        } else {
            n_right += 1;
            pos_right += labels[i];
        }
    }

    if n_left < min_leaf || n_right < min_leaf {
        return f64::MAX;
    }

    let n = labels.len() as f64;
    let gini = |count: usize, pos: f64| {
        let p = pos / count as f64;
        2.0 * p * (1.0 - p)
    };
    (n_left as f64 / n) * gini(n_left, pos_left) + (n_right as f64 / n) * gini(n_right, pos_right)
}
