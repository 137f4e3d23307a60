//! Shared UI primitives for group tree rendering.
//!
//! `TreeView` owns the current forest, its expansion/selection state and the
//! active search query, and flattens them into rows for a list widget.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{ListItem, ListState};

use crate::build::{BuildOutcome, BuildWarning};
use crate::filter::{self, filter_forest};
use crate::model::{self, Selection, TreeNode};
use crate::state::{SelectionSink, TreeState};

/// A flattened tree row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub key: String,
    pub display_name: String,
    pub id: Option<String>,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub is_last_at_depth: Vec<bool>,
    /// The name itself matches the active query.
    pub matched: bool,
}

/// Flatten the forest into visible rows, descending only into expanded
/// branches. `query` is only used to flag matching rows.
pub fn flatten_visible(forest: &[TreeNode], state: &TreeState, query: &str) -> Vec<TreeRow> {
    let searching = !query.trim().is_empty();
    let mut rows = Vec::new();
    for (i, root) in forest.iter().enumerate() {
        let is_last = i == forest.len() - 1;
        flatten_node(&mut rows, root, state, query, searching, 0, &mut vec![is_last]);
    }
    rows
}

fn flatten_node(
    rows: &mut Vec<TreeRow>,
    node: &TreeNode,
    state: &TreeState,
    query: &str,
    searching: bool,
    depth: usize,
    is_last_at_depth: &mut Vec<bool>,
) {
    let has_children = !node.children.is_empty();
    let expanded = has_children && state.is_expanded(&node.key);

    rows.push(TreeRow {
        key: node.key.clone(),
        display_name: node.display_name.clone(),
        id: node.id.clone(),
        depth,
        has_children,
        expanded,
        is_last_at_depth: is_last_at_depth.clone(),
        matched: searching && filter::matches(&node.display_name, query),
    });

    if expanded {
        for (i, child) in node.children.iter().enumerate() {
            let child_is_last = i == node.children.len() - 1;
            is_last_at_depth.push(child_is_last);
            flatten_node(rows, child, state, query, searching, depth + 1, is_last_at_depth);
            is_last_at_depth.pop();
        }
    }
}

// ── Rendering helpers ──────────────────────────────────────────────────

/// Build the tree connector prefix string for a row.
pub fn tree_prefix(row: &TreeRow) -> String {
    let mut prefix = String::new();
    for d in 1..row.depth + 1 {
        if d == row.depth {
            if row.is_last_at_depth[d] {
                prefix.push_str("└── ");
            } else {
                prefix.push_str("├── ");
            }
        } else if row.is_last_at_depth[d] {
            prefix.push_str("    ");
        } else {
            prefix.push_str("│   ");
        }
    }
    prefix
}

fn expand_indicator(row: &TreeRow) -> &'static str {
    match (row.has_children, row.expanded) {
        (false, _) => "  ",
        (true, true) => "v ",
        (true, false) => "> ",
    }
}

/// Build ListItems for all tree rows. The selected row is marked with `*`.
pub fn build_tree_items(rows: &[TreeRow], selected: Option<&str>) -> Vec<ListItem<'static>> {
    rows.iter()
        .map(|row| {
            let is_selected = selected == Some(row.key.as_str());
            let name_style = match (is_selected, row.matched) {
                (true, _) => Style::default().fg(Color::Green).bold(),
                (false, true) => Style::default().fg(Color::Yellow).bold(),
                (false, false) => Style::default().bold(),
            };
            let code = row
                .id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_default();

            let spans = vec![
                Span::raw(tree_prefix(row)),
                Span::raw(expand_indicator(row)),
                Span::styled(
                    if is_selected { "* " } else { "  " },
                    Style::default().fg(Color::Green),
                ),
                Span::styled(row.display_name.clone(), name_style),
                Span::styled(code, Style::default().fg(Color::DarkGray)),
            ];
            ListItem::new(Line::from(spans))
        })
        .collect()
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Modal state for the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    Normal,
    Search,
    Help,
}

/// Action returned by `TreeView::handle_key()`.
#[derive(Debug, PartialEq, Eq)]
pub enum TreeKeyAction {
    Quit,
    /// Report the row under the cursor to the form.
    Select,
    /// Key was not handled; caller should check app-specific bindings.
    Unhandled,
    /// Handled, no further action needed.
    Continue,
}

pub struct TreeView {
    pub forest: Vec<TreeNode>,
    pub warnings: Vec<BuildWarning>,
    pub state: TreeState,
    pub query: String,
    pub rows: Vec<TreeRow>,
    pub cursor: usize,
    pub list_state: ListState,
    pub mode: TreeMode,
    pub error: Option<String>,
}

impl Default for TreeView {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeView {
    pub fn new() -> Self {
        Self {
            forest: Vec::new(),
            warnings: Vec::new(),
            state: TreeState::new(),
            query: String::new(),
            rows: Vec::new(),
            cursor: 0,
            list_state: ListState::default(),
            mode: TreeMode::Normal,
            error: None,
        }
    }

    /// Replace the forest with a new snapshot.
    pub fn load(&mut self, outcome: BuildOutcome) {
        self.forest = outcome.forest;
        self.warnings = outcome.warnings;
        self.state.apply_snapshot(&self.forest);
        self.refresh_rows();
    }

    /// Recompute visible rows, keeping the cursor on the same key if it is
    /// still visible.
    pub fn refresh_rows(&mut self) {
        let cursor_key = self.cursor_key().map(str::to_string);
        let visible = filter_forest(&self.forest, &self.query);
        self.rows = flatten_visible(&visible, &self.state, &self.query);
        if let Some(pos) = cursor_key.and_then(|k| self.rows.iter().position(|r| r.key == k)) {
            self.cursor = pos;
        }
        self.clamp_cursor();
    }

    pub fn cursor_key(&self) -> Option<&str> {
        self.rows.get(self.cursor).map(|r| r.key.as_str())
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_down(&mut self) {
        if !self.rows.is_empty() && self.cursor < self.rows.len() - 1 {
            self.cursor += 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    /// Clamp cursor after rows change.
    pub fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= self.rows.len() {
                self.cursor = self.rows.len() - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn toggle_expand(&mut self) {
        if let Some(row) = self.rows.get(self.cursor) {
            if row.has_children {
                let key = row.key.clone();
                self.state.toggle_expand(&key);
                self.refresh_rows();
            }
        }
    }

    /// Select the node under the cursor and report it to `sink`.
    pub fn select_current<S: SelectionSink>(&mut self, sink: &mut S) -> Option<Selection> {
        let key = self.cursor_key()?;
        let node = model::find(&self.forest, key)?;
        Some(self.state.select_into(node, sink))
    }

    /// The selected node, unless a rebuild removed it.
    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.state.selected_node(&self.forest)
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh_rows();
    }

    /// Handle a key press. Returns an action for the caller.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeKeyAction {
        match self.mode {
            TreeMode::Help => {
                if matches!(
                    key.code,
                    KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
                ) {
                    self.mode = TreeMode::Normal;
                }
                TreeKeyAction::Continue
            }
            TreeMode::Search => self.handle_search(key),
            TreeMode::Normal => {
                self.error = None;
                match key.code {
                    KeyCode::Char('q') => TreeKeyAction::Quit,
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.move_down();
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.move_up();
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char(' ') => {
                        self.toggle_expand();
                        TreeKeyAction::Continue
                    }
                    KeyCode::Enter => TreeKeyAction::Select,
                    KeyCode::Char('/') => {
                        self.mode = TreeMode::Search;
                        TreeKeyAction::Continue
                    }
                    KeyCode::Esc if !self.query.is_empty() => {
                        self.set_query("");
                        TreeKeyAction::Continue
                    }
                    KeyCode::Char('?') => {
                        self.mode = TreeMode::Help;
                        TreeKeyAction::Continue
                    }
                    _ => TreeKeyAction::Unhandled,
                }
            }
        }
    }

    fn handle_search(&mut self, key: KeyEvent) -> TreeKeyAction {
        match key.code {
            KeyCode::Esc => {
                self.mode = TreeMode::Normal;
                self.set_query("");
            }
            KeyCode::Enter => self.mode = TreeMode::Normal,
            KeyCode::Down => self.move_down(),
            KeyCode::Up => self.move_up(),
            KeyCode::Backspace => {
                let mut q = self.query.clone();
                q.pop();
                self.set_query(&q);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.set_query("");
            }
            KeyCode::Char(c) => {
                let q = format!("{}{c}", self.query);
                self.set_query(&q);
            }
            _ => {}
        }
        TreeKeyAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_forest;
    use crate::fields::FieldMap;
    use serde_json::json;

    fn outcome() -> BuildOutcome {
        let raw = json!([
            {"fAcname": "Assets", "fcode": "1", "children": [
                {"fAcname": "Cash", "fcode": "2", "children": [{"fAcname": "Petty Cash", "fcode": "3"}]},
                {"fAcname": "Bank", "fcode": "4"}
            ]},
            {"fAcname": "Liabilities", "fcode": "5", "children": [{"fAcname": "Duties", "fcode": "6"}]}
        ]);
        BuildOutcome {
            forest: build_forest(&raw, &FieldMap::builtin("ledger-group").unwrap()),
            warnings: vec![],
        }
    }

    fn loaded() -> TreeView {
        let mut tv = TreeView::new();
        tv.load(outcome());
        tv
    }

    fn names(tv: &TreeView) -> Vec<&str> {
        tv.rows.iter().map(|r| r.display_name.as_str()).collect()
    }

    fn press(tv: &mut TreeView, code: KeyCode) -> TreeKeyAction {
        tv.handle_key(KeyEvent::from(code))
    }

    fn row(depth: usize, is_last_at_depth: Vec<bool>) -> TreeRow {
        TreeRow {
            key: "k".into(),
            display_name: "n".into(),
            id: None,
            depth,
            has_children: false,
            expanded: false,
            is_last_at_depth,
            matched: false,
        }
    }

    // ── tree_prefix ──

    #[test]
    fn tree_prefix_root_is_empty() {
        assert_eq!(tree_prefix(&row(0, vec![true])), "");
    }

    #[test]
    fn tree_prefix_last_child() {
        assert_eq!(tree_prefix(&row(1, vec![false, true])), "└── ");
    }

    #[test]
    fn tree_prefix_middle_child() {
        assert_eq!(tree_prefix(&row(1, vec![false, false])), "├── ");
    }

    #[test]
    fn tree_prefix_nested_depth_2() {
        assert_eq!(tree_prefix(&row(2, vec![false, false, true])), "│   └── ");
    }

    // ── flatten_visible ──

    #[test]
    fn roots_expanded_after_first_load() {
        let tv = loaded();
        assert_eq!(names(&tv), vec!["Assets", "Cash", "Bank", "Liabilities", "Duties"]);
        assert_eq!(tv.rows[1].depth, 1);
        assert!(tv.rows[1].has_children && !tv.rows[1].expanded);
    }

    #[test]
    fn leaves_never_expanded() {
        let mut st = TreeState::new();
        st.toggle_expand("/1#0/4#1");
        let forest = outcome().forest;
        st.toggle_expand("/1#0");
        let rows = flatten_visible(&forest, &st, "");
        let bank = rows.iter().find(|r| r.display_name == "Bank").unwrap();
        assert!(!bank.has_children && !bank.expanded);
    }

    #[test]
    fn filtered_rows_use_same_expansion() {
        let mut tv = loaded();
        tv.set_query("petty");
        // Cash is collapsed, so the match stays hidden until expanded.
        assert_eq!(names(&tv), vec!["Assets", "Cash"]);
        tv.cursor = 1;
        tv.toggle_expand();
        assert_eq!(names(&tv), vec!["Assets", "Cash", "Petty Cash"]);
        assert!(tv.rows[2].matched);
        assert!(!tv.rows[0].matched);

        tv.set_query("");
        assert!(tv.state.is_expanded("/1#0/2#0"));
        assert_eq!(tv.rows.len(), 6);
    }

    // ── TreeView ──

    #[test]
    fn move_down_clamps() {
        let mut tv = loaded();
        for _ in 0..10 {
            tv.move_down();
        }
        assert_eq!(tv.cursor, 4);
        tv.move_up();
        assert_eq!(tv.cursor, 3);
    }

    #[test]
    fn toggle_on_leaf_is_noop() {
        let mut tv = loaded();
        tv.cursor = 2; // Bank
        let before = tv.state.clone();
        tv.toggle_expand();
        assert_eq!(tv.state, before);
    }

    #[test]
    fn cursor_follows_key_across_reload() {
        let mut tv = loaded();
        tv.cursor = 3; // Liabilities
        let mut next = outcome();
        next.forest.remove(0);
        tv.load(next);
        assert_eq!(names(&tv), vec!["Liabilities", "Duties"]);
        assert_eq!(tv.cursor, 0);
        assert_eq!(tv.cursor_key(), Some("/5#1"));

        let mut tv = loaded();
        tv.cursor = 2; // Bank
        tv.load(outcome());
        assert_eq!(tv.cursor_key(), Some("/1#0/4#1"));
    }

    #[test]
    fn select_reports_and_survives_filter() {
        let mut tv = loaded();
        tv.cursor = 4; // Duties
        let mut reported = Vec::new();
        let sel = tv
            .select_current(&mut |s: &Selection| reported.push(s.clone()))
            .unwrap();
        assert_eq!(sel.display_name, "Duties");
        assert_eq!(sel.id.as_deref(), Some("6"));
        assert_eq!(reported.len(), 1);

        tv.set_query("cash");
        assert_eq!(tv.selected_node().unwrap().display_name, "Duties");
    }

    #[test]
    fn stale_selection_after_reload() {
        let mut tv = loaded();
        tv.cursor = 4;
        tv.select_current(&mut |_: &Selection| {});
        let mut next = outcome();
        next.forest.pop();
        tv.load(next);
        assert!(tv.selected_node().is_none());
    }

    #[test]
    fn search_mode_typing_filters() {
        let mut tv = loaded();
        press(&mut tv, KeyCode::Char('/'));
        assert_eq!(tv.mode, TreeMode::Search);
        press(&mut tv, KeyCode::Char('d'));
        press(&mut tv, KeyCode::Char('u'));
        assert_eq!(tv.query, "du");
        assert_eq!(names(&tv), vec!["Liabilities", "Duties"]);
        press(&mut tv, KeyCode::Backspace);
        assert_eq!(tv.query, "d");
        press(&mut tv, KeyCode::Enter);
        assert_eq!(tv.mode, TreeMode::Normal);
        assert_eq!(tv.query, "d");
        press(&mut tv, KeyCode::Esc);
        assert_eq!(tv.query, "");
        assert_eq!(tv.rows.len(), 5);
    }

    #[test]
    fn search_escape_clears() {
        let mut tv = loaded();
        press(&mut tv, KeyCode::Char('/'));
        press(&mut tv, KeyCode::Char('x'));
        assert!(tv.rows.is_empty());
        press(&mut tv, KeyCode::Esc);
        assert_eq!(tv.mode, TreeMode::Normal);
        assert_eq!(tv.rows.len(), 5);
    }

    #[test]
    fn handle_key_basics() {
        let mut tv = loaded();
        assert_eq!(press(&mut tv, KeyCode::Char('q')), TreeKeyAction::Quit);
        assert_eq!(press(&mut tv, KeyCode::Enter), TreeKeyAction::Select);
        assert_eq!(press(&mut tv, KeyCode::Char('z')), TreeKeyAction::Unhandled);
        tv.cursor = 1;
        assert_eq!(press(&mut tv, KeyCode::Char(' ')), TreeKeyAction::Continue);
        assert!(tv.state.is_expanded("/1#0/2#0"));
    }

    #[test]
    fn help_toggle() {
        let mut tv = loaded();
        press(&mut tv, KeyCode::Char('?'));
        assert_eq!(tv.mode, TreeMode::Help);
        assert_eq!(press(&mut tv, KeyCode::Char('j')), TreeKeyAction::Continue);
        assert_eq!(tv.cursor, 0);
        press(&mut tv, KeyCode::Esc);
        assert_eq!(tv.mode, TreeMode::Normal);
    }

    // ── build_tree_items / centered_rect ──

    #[test]
    fn build_tree_items_one_per_row() {
        let tv = loaded();
        let items = build_tree_items(&tv.rows, Some("/1#0"));
        assert_eq!(items.len(), tv.rows.len());
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        let r = centered_rect(40, 20, area);
        assert_eq!(r.width, 20);
        assert_eq!(r.height, 10);
        let r = centered_rect(10, 4, Rect::new(0, 0, 80, 24));
        assert_eq!((r.x, r.y), (35, 10));
    }
}
