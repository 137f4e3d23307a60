use anyhow::Result;
use log::{info, warn};

use crate::fields::FieldMap;
use crate::model::Selection;
use crate::perms::FormPermissions;
use crate::snapshot;
use crate::state::SelectionSink;
use crate::ui::TreeView;

/// The create/edit/delete form beside the tree. It only shows what the
/// tree reports to it.
#[derive(Debug, Default)]
pub struct FormPanel {
    pub selection: Option<Selection>,
    pub permissions: Option<FormPermissions>,
}

impl SelectionSink for FormPanel {
    fn selected(&mut self, selection: &Selection) {
        self.selection = Some(selection.clone());
    }
}

pub struct App {
    pub tree: TreeView,
    pub form: FormPanel,
    pub source: String,
    fields: FieldMap,
    max_depth: Option<usize>,
}

impl App {
    pub fn new(
        source: &str,
        fields: FieldMap,
        max_depth: Option<usize>,
        permissions: Option<FormPermissions>,
    ) -> Result<Self> {
        let mut app = App {
            tree: TreeView::new(),
            form: FormPanel {
                selection: None,
                permissions,
            },
            source: source.to_string(),
            fields,
            max_depth,
        };
        app.reload()?;
        Ok(app)
    }

    /// Re-read the snapshot and replace the forest.
    pub fn reload(&mut self) -> Result<()> {
        let outcome = snapshot::load_forest(&self.source, &self.fields, self.max_depth)?;
        info!(
            "loaded {} root group(s) from {} ({} warning(s))",
            outcome.forest.len(),
            self.source,
            outcome.warnings.len()
        );
        self.tree.load(outcome);
        if let Some(node) = self.tree.selected_node() {
            self.form.selection = Some(Selection::from(node));
        }
        Ok(())
    }

    /// Reload, keeping the current tree and showing the error if the
    /// snapshot can't be read (e.g. caught mid-write).
    pub fn reload_or_report(&mut self) {
        if let Err(e) = self.reload() {
            warn!("reload of {} failed: {e:#}", self.source);
            self.tree.error = Some(format!("{e:#}"));
        }
    }

    pub fn select(&mut self) {
        self.tree.select_current(&mut self.form);
    }

    pub fn clear_selection(&mut self) {
        self.tree.state.clear_selection();
        self.form.selection = None;
    }

    /// The form shows a node the latest snapshot no longer contains.
    pub fn selection_is_stale(&self) -> bool {
        self.form.selection.is_some() && self.tree.selected_node().is_none()
    }
}
