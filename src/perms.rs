//! Client-side form permissions: which CRUD actions a role may perform on
//! a master form (e.g. `FRMLGRP` for ledger groups).

use std::fmt;

use anyhow::bail;
use serde::Serialize;
use serde_json::{Map, Value};

pub const ADMIN_ROLE: &str = "Admin";

const FORM_FIELDS: [&str; 3] = ["formPermission", "fForm", "formCode"];
const PERMISSION_FIELDS: [&str; 2] = ["fPermission", "permission"];
const CREATE_FIELDS: [&str; 3] = ["add", "fAdd", "addPermission"];
const EDIT_FIELDS: [&str; 3] = ["edit", "fMod", "editPermission"];
const DELETE_FIELDS: [&str; 5] = ["delete", "del", "fDel", "deletePermission", "delPermission"];
const PRINT_FIELDS: [&str; 3] = ["print", "fPrint", "printPermission"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Edit,
    Delete,
    Print,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Edit, Action::Delete, Action::Print];

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "print" => Ok(Self::Print),
            _ => bail!("invalid action '{s}': must be create, edit, delete, or print"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Print => "print",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flag in the administration grid: the master permission or one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Permission,
    Action(Action),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPermissions {
    pub permission: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_print: bool,
}

/// Backends send flags as booleans, numbers, `"Y"` or `"1"`/`"true"`.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.as_str(), "Y" | "1" | "true" | "True"),
        _ => false,
    }
}

fn any_flag(record: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().filter_map(|k| record.get(*k)).any(truthy)
}

impl FormPermissions {
    pub fn admin() -> Self {
        Self {
            permission: true,
            can_create: true,
            can_edit: true,
            can_delete: true,
            can_print: true,
        }
    }

    /// Permissions of one permission record.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            permission: any_flag(record, &PERMISSION_FIELDS),
            can_create: any_flag(record, &CREATE_FIELDS),
            can_edit: any_flag(record, &EDIT_FIELDS),
            can_delete: any_flag(record, &DELETE_FIELDS),
            can_print: any_flag(record, &PRINT_FIELDS),
        }
    }

    /// Resolve what `role` may do on `form_code` given the user's records.
    ///
    /// Admins may do everything. Anyone else gets the first record naming
    /// the form, or nothing when there is none.
    pub fn resolve(role: Option<&str>, records: &Value, form_code: &str) -> Self {
        if role == Some(ADMIN_ROLE) {
            return Self::admin();
        }
        find_record(records, form_code)
            .map(Self::from_record)
            .unwrap_or_default()
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
            Action::Print => self.can_print,
        }
    }

    pub fn allowed_actions(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }

    pub fn has_any(&self) -> bool {
        self.permission || Action::ALL.into_iter().any(|a| self.allows(a))
    }

    fn action_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Create => &mut self.can_create,
            Action::Edit => &mut self.can_edit,
            Action::Delete => &mut self.can_delete,
            Action::Print => &mut self.can_print,
        }
    }

    /// Toggle a flag with the administration grid's rules: clearing the
    /// master permission clears every action, and actions only toggle while
    /// the master permission is granted.
    pub fn toggle(&mut self, flag: Flag) {
        match flag {
            Flag::Permission => {
                self.permission = !self.permission;
                if !self.permission {
                    *self = Self::default();
                }
            }
            Flag::Action(action) if self.permission => {
                let slot = self.action_mut(action);
                *slot = !*slot;
            }
            Flag::Action(_) => {}
        }
    }
}

/// The first permission record naming `form_code`. A single object is
/// accepted in place of an array.
pub fn find_record<'a>(records: &'a Value, form_code: &str) -> Option<&'a Map<String, Value>> {
    let names_form = |rec: &&Map<String, Value>| {
        FORM_FIELDS
            .iter()
            .any(|k| rec.get(*k).and_then(Value::as_str) == Some(form_code))
    };
    match records {
        Value::Array(items) => items.iter().filter_map(Value::as_object).find(names_form),
        Value::Object(rec) => Some(rec).filter(names_form),
        _ => None,
    }
}
