//! Collector for accumulating diagnostics during a processing phase.
//!
//! Each phase reports every independent problem it finds instead of stopping
//! at the first one.

use crate::{
    error::Diagnostic,
    span::{LineIndex, Span},
};

/// Accumulates diagnostics and attaches line/column locations to them.
#[derive(Debug)]
pub struct DiagnosticCollector<'a> {
    index: &'a LineIndex<'a>,
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl<'a> DiagnosticCollector<'a> {
    /// Create a new empty collector over the given source index.
    pub fn new(index: &'a LineIndex<'a>) -> Self {
        Self {
            index,
            diagnostics: Vec::new(),
            has_errors: false,
        }
    }

    /// Emit a diagnostic located at the start of `span`.
    ///
    /// The span also becomes the primary label with `label` as its message.
    pub fn emit_at(&mut self, span: Span, label: &str, diagnostic: Diagnostic) {
        let location = self.index.location(span.start());
        self.emit(diagnostic.with_location(location).with_label(span, label));
    }

    /// Emit a diagnostic as is.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` once any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection and return every diagnostic, warnings included.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Location};

    #[test]
    fn test_collector_warning_only() {
        let index = LineIndex::new("");
        let mut collector = DiagnosticCollector::new(&index);

        collector.emit(Diagnostic::warning("test warning"));

        assert!(!collector.has_errors());
        assert_eq!(collector.into_diagnostics().len(), 1);
    }

    #[test]
    fn test_collector_emit_at_sets_location() {
        let index = LineIndex::new("<scxml>\n  <state>");
        let mut collector = DiagnosticCollector::new(&index);

        collector.emit_at(
            Span::new(10..16),
            "opened here",
            Diagnostic::error("unclosed tag <state>").with_code(ErrorCode::E001),
        );

        assert!(collector.has_errors());
        let diagnostics = collector.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location(), Some(Location::new(2, 3)));
        assert_eq!(diagnostics[0].labels()[0].message(), "opened here");
    }
}
