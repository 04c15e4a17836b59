//! # Layout Files
//!
//! A layout is the editable part of a session written as JSON: fields,
//! their column bindings, and the naming policy.
//!
//! ```json
//! {
//!   "fields": [
//!     { "name": "greeting", "x": 10, "y": 10, "kind": "text",
//!       "font_size_px": 20, "font_family": "spleen", "color": "#000000" }
//!   ],
//!   "bindings": { "greeting": "name" },
//!   "naming": { "source_column": null, "include_sequence_number": true }
//! }
//! ```
//!
//! Fields missing from `bindings` start unbound. A binding for a field that
//! does not exist is an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::binding::BindingTable;
use crate::error::FieldpressError;
use crate::field::Field;
use crate::naming::FileNamingPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub fields: Vec<Field>,
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
    #[serde(default)]
    pub naming: FileNamingPolicy,
}

impl Layout {
    pub fn from_json(json: &str) -> Result<Self, FieldpressError> {
        serde_json::from_str(json)
            .map_err(|e| FieldpressError::Config(format!("Invalid layout: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, FieldpressError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FieldpressError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, FieldpressError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FieldpressError::Config(format!("Failed to write layout: {}", e)))
    }

    pub fn from_parts(
        fields: &[Field],
        bindings: &BindingTable,
        naming: &FileNamingPolicy,
    ) -> Self {
        Self {
            fields: fields.to_vec(),
            bindings: bindings
                .iter()
                .filter_map(|(name, column)| Some((name.to_string(), column?.to_string())))
                .collect(),
            naming: naming.clone(),
        }
    }

    /// Validated fields (trimmed names, clamped sizes), a complete binding
    /// table, and the naming policy.
    pub fn into_parts(
        self,
    ) -> Result<(Vec<Field>, BindingTable, FileNamingPolicy), FieldpressError> {
        let mut fields = self.fields;
        let mut seen = HashSet::new();
        for field in &mut fields {
            field.name = field.name.trim().to_string();
            field.normalize();
            if field.name.is_empty() {
                return Err(FieldpressError::InvalidField(
                    "Field name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.clone()) {
                return Err(FieldpressError::InvalidField(format!(
                    "Duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let mut table = BindingTable::for_fields(&fields);
        for (name, column) in self.bindings {
            if !table.contains(&name) {
                return Err(FieldpressError::Config(format!(
                    "Binding for unknown field '{}'",
                    name
                )));
            }
            table.bind(&name, Some(column))?;
        }
        Ok((fields, table, self.naming))
    }
}
