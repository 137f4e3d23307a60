use std::borrow::Cow;

use crate::model::TreeNode;

/// Case-insensitive substring match of an already-lowercased needle.
fn contains_lowered(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

/// Whether `name` matches `query` under the filter's rules.
/// A blank query matches everything.
pub fn matches(name: &str, query: &str) -> bool {
    let q = query.trim();
    q.is_empty() || contains_lowered(name, &q.to_lowercase())
}

/// Prune `forest` to the nodes whose name contains `query`, plus every
/// ancestor of such a node.
///
/// A blank query returns the forest itself. Kept nodes are copies whose
/// children are the filtered children, so a matching group with no matching
/// descendants shows up as a leaf.
pub fn filter_forest<'a>(forest: &'a [TreeNode], query: &str) -> Cow<'a, [TreeNode]> {
    let q = query.trim();
    if q.is_empty() {
        return Cow::Borrowed(forest);
    }
    Cow::Owned(filter_level(forest, &q.to_lowercase()))
}

fn filter_level(nodes: &[TreeNode], needle: &str) -> Vec<TreeNode> {
    let mut out = Vec::new();
    for node in nodes {
        let children = filter_level(&node.children, needle);
        if !children.is_empty() || contains_lowered(&node.display_name, needle) {
            out.push(TreeNode {
                key: node.key.clone(),
                display_name: node.display_name.clone(),
                id: node.id.clone(),
                children,
            });
        }
    }
    out
}
