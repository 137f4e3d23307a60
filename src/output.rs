use crate::build::BuildWarning;
use crate::model::TreeNode;
use crate::options::GroupOption;
use crate::perms::{Action, FormPermissions};

/// Render the forest as an indented tree with connectors.
pub fn format_forest(forest: &[TreeNode]) -> String {
    let mut out = String::new();
    for root in forest {
        write_tree(&mut out, root, "", "");
    }
    out
}

fn node_line(node: &TreeNode) -> String {
    match &node.id {
        Some(id) => format!("{} [{id}]", node.display_name),
        None => node.display_name.clone(),
    }
}

/// Write a node line and recurse into children.
/// `line_prefix` is what goes before the name on this node's line.
/// `child_prefix` is the base prefix for this node's children's tree connectors.
fn write_tree(out: &mut String, node: &TreeNode, line_prefix: &str, child_prefix: &str) {
    out.push_str(&format!("{line_prefix}{}\n", node_line(node)));

    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == node.children.len() - 1;
        let (connector, extension) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        write_tree(
            out,
            child,
            &format!("{child_prefix}{connector}"),
            &format!("{child_prefix}{extension}"),
        );
    }
}

pub fn format_options(options: &[&GroupOption]) -> String {
    let mut out = String::new();
    for opt in options {
        let code = opt
            .code
            .as_ref()
            .map(|c| format!(" [{c}]"))
            .unwrap_or_default();
        let parent = opt
            .parent_name
            .as_ref()
            .map(|p| format!("  (under {p})"))
            .unwrap_or_default();
        out.push_str(&format!("{}{code}{parent}\n", opt.label));
    }
    out
}

pub fn format_permissions(form_code: &str, perms: &FormPermissions) -> String {
    let mut out = String::new();
    out.push_str(&format!("Form:        {form_code}\n"));
    out.push_str(&format!(
        "Permission:  {}\n",
        if perms.permission { "yes" } else { "no" }
    ));
    for action in Action::ALL {
        let allowed = if perms.allows(action) { "yes" } else { "no" };
        out.push_str(&format!("{:<12} {allowed}\n", format!("{action}:")));
    }
    out
}

pub fn format_warnings(warnings: &[BuildWarning]) -> String {
    let mut out = String::new();
    for w in warnings {
        out.push_str(&format!("warning: {w}\n"));
    }
    out
}
