//! Field profiles: which raw-record keys hold a node's name, id, children
//! and (for flat listings) parent reference.
//!
//! Backends name the same logical field inconsistently (`fcode`, `fCode`),
//! so each logical field is an ordered list of candidate keys. Resolution
//! happens once, at ingestion; everything downstream only sees `TreeNode`.

use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_CHILDREN_FIELD: &str = "children";
pub const DEFAULT_PLACEHOLDER: &str = "Unnamed";

/// Names of the built-in profiles, one per master page.
pub const BUILTIN_PROFILES: [&str; 4] = ["ledger-group", "ledger", "item-group", "item"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMap {
    pub name_fields: Vec<String>,
    pub id_fields: Vec<String>,
    pub children_field: String,
    pub parent_field: Option<String>,
    pub placeholder: String,
}

fn strings(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl FieldMap {
    pub fn new(name_fields: &[&str], id_fields: &[&str]) -> Self {
        Self {
            name_fields: strings(name_fields),
            id_fields: strings(id_fields),
            children_field: DEFAULT_CHILDREN_FIELD.into(),
            parent_field: None,
            placeholder: DEFAULT_PLACEHOLDER.into(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_children_field(mut self, field: &str) -> Self {
        self.children_field = field.into();
        self
    }

    pub fn with_parent_field(mut self, field: &str) -> Self {
        self.parent_field = Some(field.into());
        self
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "ledger-group" => Some(Self::new(&["fAcname", "fAcName"], &["fcode", "fCode"])),
            "ledger" => Some(
                Self::new(&["fAcname", "fAcName"], &["fcode", "fCode"])
                    .with_placeholder("Unnamed Group"),
            ),
            "item-group" | "item" => Some(Self::new(
                &["fitemname", "fitemName"],
                &["fitemcode", "fitemCode"],
            )),
            _ => None,
        }
    }

    /// Display name of a record, falling back to the placeholder.
    pub fn name_of(&self, record: &Map<String, Value>) -> String {
        first_present(record, &self.name_fields).unwrap_or_else(|| self.placeholder.clone())
    }

    pub fn id_of(&self, record: &Map<String, Value>) -> Option<String> {
        first_present(record, &self.id_fields)
    }

    pub fn parent_of(&self, record: &Map<String, Value>) -> Option<String> {
        let field = self.parent_field.as_ref()?;
        record.get(field).and_then(scalar_text)
    }

    pub fn children_of<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a [Value]> {
        match record.get(&self.children_field) {
            Some(Value::Array(items)) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// The first candidate key whose value is a non-empty string or a number.
pub fn first_present(record: &Map<String, Value>, keys: &[String]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(k))
        .find_map(scalar_text)
}

/// Text of a string or number value; empty strings count as absent.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
