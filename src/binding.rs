//! # Row Data Binding
//!
//! Every field has exactly one binding entry, keyed by the field's name, that
//! optionally names a data column. [`resolve_display_value`] is the one rule
//! used by both the editor preview and the export pipeline to pick what a
//! field shows for a row.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::Row;
use crate::error::FieldpressError;
use crate::field::Field;

/// Field name → bound column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BindingTable {
    entries: BTreeMap<String, Option<String>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One unbound entry per field.
    pub fn for_fields(fields: &[Field]) -> Self {
        Self {
            entries: fields.iter().map(|f| (f.name.clone(), None)).collect(),
        }
    }

    /// Add an unbound entry. Existing entries are left untouched.
    pub fn insert(&mut self, field_name: &str) {
        self.entries.entry(field_name.to_string()).or_insert(None);
    }

    pub fn remove(&mut self, field_name: &str) {
        self.entries.remove(field_name);
    }

    /// Move an entry to a new key, keeping its column. Fails without changes
    /// if `new` is already taken or `old` is missing.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), FieldpressError> {
        if old == new {
            return Ok(());
        }
        if self.entries.contains_key(new) {
            return Err(FieldpressError::InvalidField(format!(
                "A binding named '{}' already exists",
                new
            )));
        }
        let column = self.entries.remove(old).ok_or_else(|| {
            FieldpressError::InvalidField(format!("No binding for field '{}'", old))
        })?;
        self.entries.insert(new.to_string(), column);
        Ok(())
    }

    /// Bind (or unbind with `None`) an existing entry.
    pub fn bind(
        &mut self,
        field_name: &str,
        column: Option<String>,
    ) -> Result<(), FieldpressError> {
        let entry = self.entries.get_mut(field_name).ok_or_else(|| {
            FieldpressError::InvalidField(format!("No binding for field '{}'", field_name))
        })?;
        *entry = column.filter(|c| !c.trim().is_empty());
        Ok(())
    }

    pub fn column_for(&self, field_name: &str) -> Option<&str> {
        self.entries.get(field_name)?.as_deref()
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.entries.contains_key(field_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// The string a field shows for `row`.
///
/// Falls back to the field's demo value when there is no row, no bound
/// column, or the bound cell is missing or blank. Otherwise the trimmed cell.
pub fn resolve_display_value(field: &Field, row: Option<&Row>, bindings: &BindingTable) -> String {
    let cell = row
        .zip(bindings.column_for(&field.name))
        .and_then(|(row, column)| row.get(column))
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match cell {
        Some(value) => value.to_string(),
        None => field.demo_value.clone(),
    }
}

/// Fields whose binding has no column.
pub fn unmapped_fields<'a>(fields: &'a [Field], bindings: &BindingTable) -> Vec<&'a Field> {
    fields
        .iter()
        .filter(|f| bindings.column_for(&f.name).is_none())
        .collect()
}
