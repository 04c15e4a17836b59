//! Archive writer boundary and the default zip implementation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive entry name is empty")]
    EmptyName,

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Collects named entries and serializes them into one archive blob.
///
/// Adding an entry under a name that already exists replaces it.
pub trait ArchiveWriter: Send {
    fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), ArchiveError>;

    /// Number of distinct entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn serialize(self: Box<Self>) -> Result<Vec<u8>, ArchiveError>;
}

/// Deflate-compressed zip archive, written in memory.
#[derive(Debug, Default)]
pub struct ZipArchiveWriter {
    entries: Vec<(String, Vec<u8>)>,
    /// Position of each name in `entries`.
    index: HashMap<String, usize>,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        if name.is_empty() {
            return Err(ArchiveError::EmptyName);
        }
        match self.index.entry(name.to_string()) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 = bytes,
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((name.to_string(), bytes));
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn serialize(self: Box<Self>) -> Result<Vec<u8>, ArchiveError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in self.entries {
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}
