//! Error types for Statecraft operations.
//!
//! This module provides the main error type [`StatecraftError`] which wraps
//! the error conditions of every stage: reading input, parsing, layout,
//! metadata serialization and edit commands.

use std::io;

use thiserror::Error;

use statecraft_parser::ParseError;

use crate::{commands::CommandError, layout::LayoutError, metadata::MetadataError};

/// The main error type for Statecraft operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so that
/// callers can render labelled snippets without re-reading the input.
#[derive(Debug, Error)]
pub enum StatecraftError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Edit failed: {0}")]
    Command(#[from] CommandError),
}

impl StatecraftError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
