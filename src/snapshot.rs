use std::io::Read as _;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::build::{BuildOutcome, Builder};
use crate::fields::FieldMap;
use crate::paths;

/// Read a JSON snapshot from a file, or from stdin for `-`.
pub fn read_snapshot(path: &str) -> Result<Value> {
    let text = if paths::is_stdin(path) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read snapshot from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("{path} is not valid JSON"))
}

/// Read and build a snapshot in one step.
pub fn load_forest(path: &str, fields: &FieldMap, max_depth: Option<usize>) -> Result<BuildOutcome> {
    let raw = read_snapshot(path)?;
    Ok(Builder::new(fields).max_depth(max_depth).build(&raw))
}
