//! # Error Types
//!
//! This module defines error types used throughout the fieldpress library.
//! Boundary collaborators (QR generation, archive writing, file naming) carry
//! their own narrower error enums next to their traits.

use thiserror::Error;

/// Main error type for fieldpress operations
#[derive(Debug, Error)]
pub enum FieldpressError {
    /// A batch run was requested without a template, data, or fields
    #[error("Missing required data: {0}")]
    MissingInput(String),

    /// Field creation, rename, or update was rejected
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Template decoding or image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Tabular data could not be read
    #[error("Data error: {0}")]
    Data(String),

    /// A font file could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    /// The archive could not be serialized
    #[error("Archive error: {0}")]
    Archive(String),

    /// The batch run was cancelled before it finished
    #[error("Export cancelled")]
    Cancelled,

    /// Configuration or layout file error
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP server error (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
