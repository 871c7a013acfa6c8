//! Scene hierarchy as reported by the engine in `available_nodes.json`.
//!
//! The engine writes a JSON array of top-level nodes; older builds wrote a
//! single root object. Both shapes are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of the scene tree. Children keep the engine's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescriptor>,
}

impl NodeDescriptor {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self { name: name.into(), children: Vec::new() }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<NodeDescriptor>) -> Self {
        Self { name: name.into(), children }
    }
}

/// Depth-first pre-order list of names: a node, then its children in order.
pub fn flatten_hierarchy(root: &NodeDescriptor) -> Vec<String> {
    let mut out = Vec::new();
    push_names(root, &mut out);
    out
}

/// Same as [`flatten_hierarchy`] over a list of top-level nodes.
pub fn flatten_forest(roots: &[NodeDescriptor]) -> Vec<String> {
    let mut out = Vec::new();
    for root in roots {
        push_names(root, &mut out);
    }
    out
}

fn push_names(node: &NodeDescriptor, out: &mut Vec<String>) {
    out.push(node.name.clone());
    for child in &node.children {
        push_names(child, out);
    }
}

/// Root sentinel check against the configured names ("root"/"Root").
pub fn is_root_name(name: &str, roots: &[String]) -> bool {
    roots.iter().any(|r| r == name)
}

/// Parsed `available_nodes.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub roots: Vec<NodeDescriptor>,
}

impl Hierarchy {
    /// Accepts `[{..}, ..]` or a single `{..}`. Anything else is `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(_) => match serde_json::from_value::<Vec<NodeDescriptor>>(value) {
                Ok(roots) => Some(Self { roots }),
                Err(e) => {
                    log::warn!("Malformed node list: {}", e);
                    None
                }
            },
            Value::Object(_) => match serde_json::from_value::<NodeDescriptor>(value) {
                Ok(root) => Some(Self { roots: vec![root] }),
                Err(e) => {
                    log::warn!("Malformed root node: {}", e);
                    None
                }
            },
            other => {
                log::warn!("Unexpected node document: {}", other);
                None
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        flatten_forest(&self.roots)
    }

    pub fn contains(&self, name: &str) -> bool {
        fn walk(nodes: &[NodeDescriptor], name: &str) -> bool {
            nodes.iter().any(|n| n.name == name || walk(&n.children, name))
        }
        walk(&self.roots, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NodeDescriptor {
        NodeDescriptor::with_children(
            "root",
            vec![
                NodeDescriptor::with_children("a", vec![NodeDescriptor::leaf("b")]),
                NodeDescriptor::leaf("c"),
            ],
        )
    }

    #[test]
    fn test_flatten_preorder() {
        assert_eq!(flatten_hierarchy(&sample()), vec!["root", "a", "b", "c"]);
    }

    #[test]
    fn test_parse_single_root_without_children_key() {
        let value = json!({"name": "root", "children": [
            {"name": "a", "children": [{"name": "b"}]},
            {"name": "c"}
        ]});
        let h = Hierarchy::from_value(value).unwrap();
        assert_eq!(h.roots, vec![sample()]);
        assert_eq!(h.names(), vec!["root", "a", "b", "c"]);
    }

    #[test]
    fn test_parse_forest() {
        let value = json!([
            {"name": "Root", "children": [{"name": "Player"}]},
            {"name": "Hud", "children": []}
        ]);
        let h = Hierarchy::from_value(value).unwrap();
        assert_eq!(h.names(), vec!["Root", "Player", "Hud"]);
        assert!(h.contains("Player"));
        assert!(!h.contains("Enemy"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Hierarchy::from_value(json!("nodes")).is_none());
        assert!(Hierarchy::from_value(json!([{"children": []}])).is_none());
    }

    #[test]
    fn test_root_names() {
        let roots = vec!["root".to_string(), "Root".to_string()];
        assert!(is_root_name("Root", &roots));
        assert!(!is_root_name("ROOT", &roots));
    }
}
