use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "grouptree",
    about = "Browse and search hierarchical master-data groups",
    version
)]
pub struct Cli {
    /// Path to the config file [default: ~/.grouptree/config.toml]
    #[arg(long, env = "GROUPTREE_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the group tree of a JSON snapshot
    Tree {
        /// Snapshot file (`-` for stdin)
        file: String,
        /// Field profile (ledger-group, ledger, item-group, item, or from config)
        #[arg(short, long)]
        profile: Option<String>,
        /// Only show groups matching this text, with their ancestors
        #[arg(short, long)]
        search: Option<String>,
        /// Maximum number of levels to keep (at least 1)
        #[arg(long, value_parser = depth_parser())]
        max_depth: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List sub-group dropdown options
    Options {
        /// Dropdown snapshot file (`-` for stdin)
        file: String,
        /// Field profile
        #[arg(short, long)]
        profile: Option<String>,
        /// Filter by label or parent group name
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a role may do on a form
    Perms {
        /// Permission records file (`-` for stdin)
        file: String,
        /// Form code (e.g. FRMLGRP)
        #[arg(short, long)]
        form: String,
        /// User role (Admin has every permission)
        #[arg(short, long)]
        role: Option<String>,
        /// Exit non-zero unless this action is allowed (create, edit, delete, print)
        #[arg(short, long)]
        action: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List field profiles
    Profiles,

    /// Launch interactive tree browser
    Browse {
        /// Snapshot file; reloaded when it changes
        file: String,
        /// Field profile
        #[arg(short, long)]
        profile: Option<String>,
        /// Maximum number of levels to keep (at least 1)
        #[arg(long, value_parser = depth_parser())]
        max_depth: Option<usize>,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_interval: u64,
        /// Permission records file, to show allowed actions for the selection
        #[arg(long, requires = "form")]
        perms: Option<String>,
        /// Form code to check permissions for
        #[arg(long, requires = "perms")]
        form: Option<String>,
        /// User role
        #[arg(long)]
        role: Option<String>,
        /// Write logs to this file
        #[arg(long)]
        log_file: Option<String>,
    },
}

/// Depth caps start at 1: the roots themselves.
fn depth_parser() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}
