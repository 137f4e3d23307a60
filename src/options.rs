//! Sub-group dropdown options.
//!
//! The dropdown lists every group flat, labelled by name and annotated with
//! the name of its parent group, and is searched by either.

use serde::Serialize;
use serde_json::Value;

use crate::fields::{scalar_text, FieldMap};

const PARENT_NAME_FIELD: &str = "parentName";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOption {
    pub label: String,
    pub parent_name: Option<String>,
    pub code: Option<String>,
}

/// Map dropdown records to options. Non-array input yields no options;
/// records that aren't objects are skipped.
pub fn build_options(raw: &Value, fields: &FieldMap) -> Vec<GroupOption> {
    let Value::Array(records) = raw else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|r| r.as_object())
        .map(|rec| GroupOption {
            label: fields.name_of(rec),
            parent_name: rec.get(PARENT_NAME_FIELD).and_then(scalar_text),
            code: fields.id_of(rec),
        })
        .collect()
}

/// Options whose label or parent name contains `query`, case-insensitively.
pub fn filter_options<'a>(options: &'a [GroupOption], query: &str) -> Vec<&'a GroupOption> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return options.iter().collect();
    }
    options
        .iter()
        .filter(|o| {
            o.label.to_lowercase().contains(&q)
                || o
                    .parent_name
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&q))
        })
        .collect()
}

/// The option carrying `code`, used to restore the dropdown after an edit.
pub fn option_for_code<'a>(options: &'a [GroupOption], code: &str) -> Option<&'a GroupOption> {
    options.iter().find(|o| o.code.as_deref() == Some(code))
}
