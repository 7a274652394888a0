//! The error returned when markup is not usable as a state machine.

use std::fmt;

use crate::error::Diagnostic;

/// Every finding of a failed validation, warnings included, so that a
/// renderer can show dangling targets next to the errors that stopped the
/// parse.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// All findings in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_warning())
    }
}

/// Shows the first error with its location, then how many errors and
/// warnings follow it.
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.errors().next().or_else(|| self.diagnostics.first()) else {
            return write!(f, "document is not valid");
        };
        write!(f, "{first}")?;

        let errors = self.errors().count().saturating_sub(1);
        let warnings = self.warnings().count();
        let warnings = if first.severity().is_warning() {
            warnings.saturating_sub(1)
        } else {
            warnings
        };
        match (errors, warnings) {
            (0, 0) => Ok(()),
            (errors, 0) => write!(f, " (+{errors} more errors)"),
            (0, warnings) => write!(f, " (+{warnings} warnings)"),
            (errors, warnings) => write!(f, " (+{errors} more errors, {warnings} warnings)"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}
