//! # Output File Naming
//!
//! Default names are `image_0001.png`, `image_0002.png`, ... (1-based row
//! number). A naming policy can take names from a data column instead:
//!
//! | Cell         | Sequence | Row 3 name          |
//! |--------------|----------|---------------------|
//! | `Jane Doe`   | on       | `0003_Jane Doe.png` |
//! | `Jane Doe`   | off      | `Jane Doe.png`      |
//! | `a/b:c`      | off      | `a_b_c.png`         |
//! | (blank)      | either   | `image_0003.png`    |
//!
//! Without sequence numbers, equal names collide and the later row wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Row;

/// Characters that cannot appear in archive entry names.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("file name from column '{column}' has no stem: '{value}'")]
    EmptyStem { column: String, value: String },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNamingPolicy {
    /// Column to take names from; `None` uses numbered names.
    #[serde(default)]
    pub source_column: Option<String>,
    /// Prefix column-derived names with the zero-padded row number.
    #[serde(default = "default_true")]
    pub include_sequence_number: bool,
}

impl Default for FileNamingPolicy {
    fn default() -> Self {
        Self {
            source_column: None,
            include_sequence_number: true,
        }
    }
}

/// `image_NNNN.png` for a 1-based row number.
pub fn default_file_name(row_number: usize) -> String {
    format!("image_{:04}.png", row_number)
}

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

impl FileNamingPolicy {
    /// Column-based policy.
    pub fn from_column(column: impl Into<String>, include_sequence_number: bool) -> Self {
        Self {
            source_column: Some(column.into()),
            include_sequence_number,
        }
    }

    /// Entry name for `row` at 1-based `row_number`.
    pub fn file_name(&self, row_number: usize, row: &Row) -> Result<String, NamingError> {
        let Some(column) = self.source_column.as_deref() else {
            return Ok(default_file_name(row_number));
        };
        let value = row.get(column).map(str::trim).unwrap_or("");
        if value.is_empty() {
            return Ok(default_file_name(row_number));
        }

        let mut name = sanitize(value);
        if !name.to_ascii_lowercase().ends_with(".png") {
            name.push_str(".png");
        }
        if name.len() == ".png".len() {
            return Err(NamingError::EmptyStem {
                column: column.to_string(),
                value: value.to_string(),
            });
        }

        if self.include_sequence_number {
            Ok(format!("{:04}_{}", row_number, name))
        } else {
            Ok(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> Row {
        Row::new([("name", name)])
    }

    #[test]
    fn test_default_naming() {
        let policy = FileNamingPolicy::default();
        assert_eq!(policy.file_name(3, &row("Jane Doe")).unwrap(), "image_0003.png");
        assert_eq!(default_file_name(12345), "image_12345.png");
    }

    #[test]
    fn test_column_naming_with_and_without_sequence() {
        let numbered = FileNamingPolicy::from_column("name", true);
        assert_eq!(numbered.file_name(3, &row("Jane Doe")).unwrap(), "0003_Jane Doe.png");

        let plain = FileNamingPolicy::from_column("name", false);
        assert_eq!(plain.file_name(3, &row("Jane Doe")).unwrap(), "Jane Doe.png");
        assert_eq!(plain.file_name(1, &row("  padded  ")).unwrap(), "padded.png");
    }

    #[test]
    fn test_sanitizes_forbidden_characters() {
        let plain = FileNamingPolicy::from_column("name", false);
        assert_eq!(plain.file_name(1, &row("a/b:c")).unwrap(), "a_b_c.png");
        assert_eq!(sanitize(r#"<>:"/\|?*"#), "_________");
    }

    #[test]
    fn test_existing_extension_kept() {
        let plain = FileNamingPolicy::from_column("name", false);
        assert_eq!(plain.file_name(1, &row("photo.PNG")).unwrap(), "photo.PNG");
        assert_eq!(plain.file_name(1, &row("photo.jpg")).unwrap(), "photo.jpg.png");
    }

    #[test]
    fn test_blank_or_missing_cell_falls_back() {
        let policy = FileNamingPolicy::from_column("name", false);
        assert_eq!(policy.file_name(7, &row("   ")).unwrap(), "image_0007.png");
        let other = FileNamingPolicy::from_column("missing", true);
        assert_eq!(other.file_name(7, &row("x")).unwrap(), "image_0007.png");
    }

    #[test]
    fn test_bare_extension_is_an_error() {
        let policy = FileNamingPolicy::from_column("name", true);
        assert!(matches!(
            policy.file_name(1, &row(".png")),
            Err(NamingError::EmptyStem { .. })
        ));
    }
}
