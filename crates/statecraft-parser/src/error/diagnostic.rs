//! The core diagnostic type.
//!
//! A [`Diagnostic`] is a single error or warning with an optional error code,
//! a line/column location, labeled byte spans and help text. The location is
//! enough for an editor to place an inline marker without re-parsing; the
//! spans feed the rich terminal report.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::{Location, Span},
};

/// A positioned message about the source text.
///
/// ```text
/// error[E001]: unclosed tag <state>
///   --> machine.scxml:2:3
///    |
///  2 |   <state id="idle">
///    |   ^^^^^^ opened here
///    |
///    = help: add `</state>` or make the tag self-closing
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    location: Option<Location>,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use statecraft_parser::error::{Diagnostic, ErrorCode};
    /// # use statecraft_parser::Span;
    ///
    /// let diag = Diagnostic::error("unexpected closing tag </state>")
    ///     .with_code(ErrorCode::E002)
    ///     .with_label(Span::new(0..8), "nothing is open here");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the 1-based line/column, if known.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Get the 1-based line, if known.
    pub fn line(&self) -> Option<usize> {
        self.location.map(|location| location.line)
    }

    /// Get the 1-based column, if known.
    pub fn column(&self) -> Option<usize> {
        self.location.map(|location| location.column)
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the line/column location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            location: None,
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(location) = self.location {
            write!(f, " at {}:{}", location.line, location.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.location().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_location() {
        let diag = Diagnostic::error("unclosed tag <state>").with_location(Location::new(4, 3));

        assert_eq!(diag.line(), Some(4));
        assert_eq!(diag.column(), Some(3));
    }

    #[test]
    fn test_diagnostic_labels() {
        let diag = Diagnostic::error("duplicate identifier: a")
            .with_secondary_label(Span::new(5..15), "first defined here")
            .with_label(Span::new(20..30), "duplicate definition");

        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.primary_span(), Some(Span::new(20..30)));
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unexpected closing tag </state>").with_code(ErrorCode::E002);

        assert_eq!(diag.to_string(), "error[E002]: unexpected closing tag </state>");
    }

    #[test]
    fn test_diagnostic_display_with_location() {
        let diag = Diagnostic::warning("empty state machine")
            .with_code(ErrorCode::E202)
            .with_location(Location::new(1, 1));

        assert_eq!(
            diag.to_string(),
            "warning[E202]: empty state machine at 1:1"
        );
    }
}
