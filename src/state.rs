//! Expansion and selection state for a tree view.
//!
//! The state is keyed by node key and kept apart from the forest itself, so
//! a fresh snapshot or an active search never has to reset it. Keys that
//! disappear from a new snapshot are dropped when the snapshot is applied.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{self, Selection, TreeNode};

/// Receives the selection reported to the form.
pub trait SelectionSink {
    fn selected(&mut self, selection: &Selection);
}

impl<F: FnMut(&Selection)> SelectionSink for F {
    fn selected(&mut self, selection: &Selection) {
        self(selection)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub expanded: BTreeSet<String>,
    pub selected: Option<String>,
    #[serde(default)]
    seeded: bool,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `key` in the expanded set. Returns whether it is now expanded.
    pub fn toggle_expand(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Make `node` the only selected node and report it.
    pub fn select(&mut self, node: &TreeNode) -> Selection {
        self.selected = Some(node.key.clone());
        Selection::from(node)
    }

    /// Select `node` and hand the report to `sink`.
    pub fn select_into<S: SelectionSink>(&mut self, node: &TreeNode, sink: &mut S) -> Selection {
        let selection = self.select(node);
        sink.selected(&selection);
        selection
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Resolve the selected key against `forest`; `None` once it is stale.
    pub fn selected_node<'a>(&self, forest: &'a [TreeNode]) -> Option<&'a TreeNode> {
        self.selected.as_deref().and_then(|k| model::find(forest, k))
    }

    /// Reconcile with a freshly built forest.
    ///
    /// The first non-empty forest expands every root. Later forests drop
    /// expanded keys that no longer exist. The selection is left as is.
    pub fn apply_snapshot(&mut self, forest: &[TreeNode]) {
        if !self.seeded {
            if forest.is_empty() {
                return;
            }
            self.seeded = true;
            self.expanded = forest.iter().map(|n| n.key.clone()).collect();
            return;
        }
        let live: HashSet<&str> = model::keys(forest).into_iter().collect();
        self.expanded.retain(|k| live.contains(k.as_str()));
    }
}
