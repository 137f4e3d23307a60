//! Hierarchical group trees for master-data forms.
//!
//! Raw backend records are normalized into a forest of [`model::TreeNode`]
//! by [`build`], pruned by a search query in [`filter`], and displayed with
//! the expansion/selection state from [`state`].

pub mod build;
pub mod config;
pub mod fields;
pub mod filter;
pub mod model;
pub mod options;
pub mod output;
pub mod paths;
pub mod perms;
pub mod snapshot;
pub mod state;
pub mod tui;
pub mod ui;
pub mod watch;

pub use build::{build_forest, BuildOutcome, BuildWarning, Builder};
pub use fields::FieldMap;
pub use filter::filter_forest;
pub use model::{Selection, TreeNode};
pub use state::{SelectionSink, TreeState};
