//! Decision-forest classifier loaded from a JSON artifact.
//!
//! ```json
//! {
//!   "n_features": 3,
//!   "classes": ["maize", "rice"],
//!   "trees": [
//!     {"nodes": [
//!       {"feature": 1, "threshold": 70.0, "left": 1, "right": 2},
//!       {"class": 0},
//!       {"class": 1}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Split nodes send `x[feature] <= threshold` left. Children must sit at a
//! higher index than their parent, so every walk terminates. The label is
//! the majority vote over trees; ties go to the lowest class index.

use crate::domain::ports::Classifier;
use crate::utils::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walks at most `nodes.len()` steps; a well-formed tree never needs more.
    fn vote(&self, features: &[f64]) -> Result<usize> {
        let broken = |message: String| AdvisorError::ModelError { message };
        let mut index = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { class }) => return Ok(*class),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature)
                        .ok_or_else(|| broken(format!("feature {} out of range", feature)))?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => return Err(broken(format!("node {} does not exist", index))),
            }
        }
        Err(broken("tree traversal did not reach a leaf".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    classes: Vec<String>,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let display = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| AdvisorError::ModelLoadError {
            path: display.clone(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content).map_err(|e| AdvisorError::ModelLoadError {
            path: display,
            message: e.to_string(),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let forest: RandomForest = serde_json::from_str(content)?;
        forest.check_structure()?;
        Ok(forest)
    }

    fn check_structure(&self) -> Result<()> {
        let invalid = |message: String| AdvisorError::ModelError { message };

        if self.n_features == 0 {
            return Err(invalid("n_features must be positive".to_string()));
        }
        if self.classes.is_empty() {
            return Err(invalid("forest has no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees".to_string()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(invalid(format!("tree {} has no nodes", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Leaf { class } if *class >= self.classes.len() => {
                        return Err(invalid(format!(
                            "tree {} node {}: class {} out of range",
                            t, i, class
                        )));
                    }
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(invalid(format!(
                                "tree {} node {}: feature {} out of range",
                                t, i, feature
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(invalid(format!(
                                "tree {} node {}: threshold is not finite",
                                t, i
                            )));
                        }
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(invalid(format!(
                                    "tree {} node {}: child {} must point forward within the tree",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { .. } => {}
                }
            }
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn input_width(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<String> {
        if features.len() != self.n_features {
            return Err(AdvisorError::ModelError {
                message: format!(
                    "expected {} features, got {}",
                    self.n_features,
                    features.len()
                ),
            });
        }
        if let Some(position) = features.iter().position(|v| !v.is_finite()) {
            return Err(AdvisorError::ModelError {
                message: format!("feature {} is not a finite number", position),
            });
        }

        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            let class = tree.vote(features)?;
            let slot = votes.get_mut(class).ok_or_else(|| AdvisorError::ModelError {
                message: format!("class {} out of range", class),
            })?;
            *slot += 1;
        }

        // max_by_key 取最後一個最大值，這裡要最低索引
        let mut winner = 0;
        for (class, count) in votes.iter().enumerate() {
            if *count > votes[winner] {
                winner = class;
            }
        }

        Ok(self.classes[winner].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUMIDITY_FOREST: &str = r#"{
        "n_features": 3,
        "classes": ["maize", "rice"],
        "trees": [
            {"nodes": [
                {"feature": 1, "threshold": 70.0, "left": 1, "right": 2},
                {"class": 0},
                {"class": 1}
            ]},
            {"nodes": [
                {"feature": 2, "threshold": 1.0, "left": 1, "right": 2},
                {"class": 0},
                {"class": 1}
            ]},
            {"nodes": [{"class": 1}]}
        ]
    }"#;

    #[test]
    fn test_majority_vote() {
        let forest = RandomForest::from_json_str(HUMIDITY_FOREST).unwrap();
        assert_eq!(forest.input_width(), 3);
        assert_eq!(forest.tree_count(), 3);
        assert_eq!(forest.classes(), &["maize".to_string(), "rice".to_string()]);
        // 濕度高、有降雨：三票皆 rice
        assert_eq!(forest.predict(&[30.0, 80.0, 2.5]).unwrap(), "rice");
        // 乾燥：兩票 maize
        assert_eq!(forest.predict(&[30.0, 40.0, 0.0]).unwrap(), "maize");
    }

    #[test]
    fn test_tie_goes_to_lowest_class() {
        let forest = RandomForest::from_json_str(
            r#"{"n_features": 1, "classes": ["a", "b"],
                "trees": [{"nodes": [{"class": 1}]}, {"nodes": [{"class": 0}]}]}"#,
        )
        .unwrap();
        assert_eq!(forest.predict(&[0.0]).unwrap(), "a");
    }

    #[test]
    fn test_predict_is_idempotent() {
        let forest = RandomForest::from_json_str(HUMIDITY_FOREST).unwrap();
        let first = forest.predict(&[25.0, 72.0, 0.5]).unwrap();
        for _ in 0..10 {
            assert_eq!(forest.predict(&[25.0, 72.0, 0.5]).unwrap(), first);
        }
    }

    #[test]
    fn test_rejects_wrong_width_and_non_finite() {
        let forest = RandomForest::from_json_str(HUMIDITY_FOREST).unwrap();
        assert!(forest.predict(&[30.0, 80.0]).is_err());
        assert!(forest.predict(&[30.0, f64::INFINITY, 1.0]).is_err());
    }

    #[test]
    fn test_rejects_backward_child() {
        let looping = r#"{"n_features": 1, "classes": ["a"],
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"class": 0}
            ]}]}"#;
        assert!(matches!(
            RandomForest::from_json_str(looping),
            Err(AdvisorError::ModelError { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let bad_class = r#"{"n_features": 1, "classes": ["a"], "trees": [{"nodes": [{"class": 3}]}]}"#;
        assert!(RandomForest::from_json_str(bad_class).is_err());

        let bad_feature = r#"{"n_features": 1, "classes": ["a"],
            "trees": [{"nodes": [
                {"feature": 5, "threshold": 1.0, "left": 1, "right": 2},
                {"class": 0}, {"class": 0}
            ]}]}"#;
        assert!(RandomForest::from_json_str(bad_feature).is_err());
    }

    #[test]
    fn test_malformed_tree_is_rejected_not_panicking() {
        // 繞過 check_structure 直接建構
        let empty = RandomForest {
            n_features: 1,
            classes: vec!["a".to_string()],
            trees: vec![Tree { nodes: vec![] }],
        };
        assert!(matches!(
            empty.predict(&[0.0]),
            Err(AdvisorError::ModelError { .. })
        ));

        let bad_class = RandomForest {
            n_features: 1,
            classes: vec!["a".to_string()],
            trees: vec![Tree {
                nodes: vec![Node::Leaf { class: 7 }],
            }],
        };
        assert!(bad_class.predict(&[0.0]).is_err());
    }

    #[test]
    fn test_self_loop_terminates() {
        let looping = RandomForest {
            n_features: 1,
            classes: vec!["a".to_string()],
            trees: vec![Tree {
                nodes: vec![Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 0,
                }],
            }],
        };
        let err = looping.predict(&[0.0]).unwrap_err();
        assert!(err.to_string().contains("did not reach a leaf"));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = RandomForest::from_file("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoadError { .. }));
    }

    #[test]
    fn test_corrupt_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(&path, b"\x80\x04\x95 pickle bytes").unwrap();
        let err = RandomForest::from_file(&path).unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoadError { .. }));
    }
}
