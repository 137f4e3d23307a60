use serde::{Deserialize, Serialize};

/// A normalized group node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub key: String,
    pub display_name: String,
    pub id: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// What a selection reports to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub display_name: String,
    pub id: Option<String>,
    pub key: String,
}

impl From<&TreeNode> for Selection {
    fn from(node: &TreeNode) -> Self {
        Self {
            display_name: node.display_name.clone(),
            id: node.id.clone(),
            key: node.key.clone(),
        }
    }
}

/// Find a node anywhere in the forest by key.
pub fn find<'a>(forest: &'a [TreeNode], key: &str) -> Option<&'a TreeNode> {
    for node in forest {
        if node.key == key {
            return Some(node);
        }
        // Descendant keys extend their ancestor's key.
        if key.starts_with(&node.key) {
            if let Some(found) = find(&node.children, key) {
                return Some(found);
            }
        }
    }
    None
}

/// All keys in depth-first order.
pub fn keys(forest: &[TreeNode]) -> Vec<&str> {
    let mut out = Vec::new();
    collect_keys(forest, &mut out);
    out
}

fn collect_keys<'a>(forest: &'a [TreeNode], out: &mut Vec<&'a str>) {
    for node in forest {
        out.push(node.key.as_str());
        collect_keys(&node.children, out);
    }
}

pub fn node_count(forest: &[TreeNode]) -> usize {
    forest.iter().map(|n| 1 + node_count(&n.children)).sum()
}
