//! Error and diagnostic system for the Statecraft parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Line/column locations alongside labeled byte spans
//! - Severity levels
//! - Diagnostic collector for accumulating multiple problems in one pass
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning with an optional error code, a location, labeled
//! source spans, and help text. Multiple diagnostics are wrapped in
//! [`ParseError`] when a caller wants a `Result`.
//!
//! # Example
//!
//! ```
//! # use statecraft_parser::error::{Diagnostic, ErrorCode};
//! # use statecraft_parser::{Location, Span};
//!
//! let diag = Diagnostic::error("duplicate identifier: s1")
//!     .with_code(ErrorCode::E201)
//!     .with_location(Location::new(3, 5))
//!     .with_label(Span::new(40..56), "duplicate definition")
//!     .with_secondary_label(Span::new(10..26), "first defined here");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, LabelRole};
pub use parse_error::ParseError;
pub use severity::Severity;
