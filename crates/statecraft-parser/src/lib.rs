//! # Statecraft Parser
//!
//! Validation and parsing for state-machine documents. This crate turns raw
//! markup into a [`statecraft_core::document::Document`] together with every
//! diagnostic found along the way.
//!
//! ## Usage
//!
//! ```
//! # use statecraft_parser::{parse, ParseOptions};
//!
//! let source = r#"<scxml initial="idle">
//!     <state id="idle"><transition event="go" target="done"/></state>
//!     <final id="done"/>
//! </scxml>"#;
//!
//! let outcome = parse(source, &ParseOptions::default());
//! assert!(outcome.success());
//! assert_eq!(outcome.document().map(|doc| doc.root().kind()), Some("scxml"));
//! ```

pub mod error;
mod lexer;
pub mod semantic;
mod span;
pub mod syntax;
mod tokens;
mod tree;

pub use error::{Diagnostic, ErrorCode, ParseError, Severity};
pub use span::{LineIndex, Location, Span};
pub use syntax::validate;

use log::{debug, info, trace};

use statecraft_core::{document::Document, semantic::ROOT, visual::VISUAL_PREFIX};

use error::DiagnosticCollector;

/// Options shared by the syntax validator and the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report a trailing incomplete tag instead of tolerating it.
    pub strict: bool,
    /// Attribute prefixes exempt from quoting and duplicate checks while
    /// undeclared. A declared prefix is exempt only when bound to the visual
    /// namespace, whatever its name.
    pub reserved_prefixes: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: false,
            reserved_prefixes: vec![VISUAL_PREFIX.to_string()],
        }
    }
}

impl ParseOptions {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_reserved_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.reserved_prefixes = prefixes;
        self
    }
}

/// The document (if one could be built) and every diagnostic of a parse.
#[derive(Debug)]
pub struct ParseOutcome {
    document: Option<Document>,
    diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// The parsed document. Present even when semantic errors were found.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// All diagnostics in encounter order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` when no diagnostic has error severity.
    pub fn success(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity().is_error())
    }

    /// Split into the optional document and the diagnostics.
    pub fn into_parts(self) -> (Option<Document>, Vec<Diagnostic>) {
        (self.document, self.diagnostics)
    }

    /// Returns the document if the parse succeeded, otherwise every
    /// diagnostic wrapped in a [`ParseError`]. Warnings are dropped on success.
    pub fn into_result(self) -> Result<Document, ParseError> {
        let success = self.success();
        match self.document {
            Some(document) if success => Ok(document),
            _ => Err(ParseError::new(self.diagnostics)),
        }
    }
}

/// Validate and parse source text.
///
/// The pipeline stops early when a stage cannot produce input for the next:
///
/// 1. **Syntax** - character-level markup checks; any error means no document
/// 2. **Tree** - tokenize and assemble elements; incomplete input means no document
/// 3. **Root** - the root must be the state-machine root
/// 4. **Semantics** - identifiers and references; the document is kept
pub fn parse(text: &str, options: &ParseOptions) -> ParseOutcome {
    info!(len = text.len(), strict = options.strict; "Parsing document");

    let diagnostics = syntax::validate(text, options);
    if diagnostics
        .iter()
        .any(|diagnostic| diagnostic.severity().is_error())
    {
        debug!(count = diagnostics.len(); "Syntax errors, no document built");
        return ParseOutcome {
            document: None,
            diagnostics,
        };
    }

    let index = LineIndex::new(text);
    let mut collector = DiagnosticCollector::new(&index);
    for diagnostic in diagnostics {
        collector.emit(diagnostic);
    }

    let lexed = lexer::tokenize(text);
    trace!(tokens = lexed.tokens.len(); "Tokenized markup");

    let Some(document) = tree::build_document(text, lexed, &mut collector) else {
        return ParseOutcome {
            document: None,
            diagnostics: collector.into_diagnostics(),
        };
    };

    if document.root().kind() != ROOT {
        let root = document.root();
        let start = root.offset().unwrap_or_default();
        let diagnostic = Diagnostic::error("root element must be the state-machine root")
            .with_code(ErrorCode::E100)
            .with_help(format!("rename <{}> to <{ROOT}>", root.kind()));
        collector.emit_at(
            Span::new(start..start + root.kind().len() + 1),
            "unexpected root",
            diagnostic,
        );
        return ParseOutcome {
            document: None,
            diagnostics: collector.into_diagnostics(),
        };
    }

    semantic::validate_document(&document, &mut collector);

    let diagnostics = collector.into_diagnostics();
    debug!(diagnostics = diagnostics.len(); "Parse finished");
    ParseOutcome {
        document: Some(document),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let outcome = parse(
            r#"<scxml initial="a"><state id="a"/></scxml>"#,
            &ParseOptions::default(),
        );
        assert!(outcome.success());
        assert!(outcome.diagnostics().is_empty());
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_syntax_error_yields_no_document() {
        let outcome = parse("<scxml><state></scxml>", &ParseOptions::default());
        assert!(!outcome.success());
        assert!(outcome.document().is_none());
        assert_eq!(outcome.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_wrong_root() {
        let outcome = parse(r#"<machine><state id="a"/></machine>"#, &ParseOptions::default());
        assert!(outcome.document().is_none());
        assert_eq!(outcome.diagnostics().len(), 1);
        assert_eq!(
            outcome.diagnostics()[0].message(),
            "root element must be the state-machine root"
        );
    }

    #[test]
    fn test_semantic_error_keeps_document() {
        let outcome = parse(
            r#"<scxml><state id="s1"><state id="s1"/></state></scxml>"#,
            &ParseOptions::default(),
        );
        assert!(!outcome.success());
        assert!(outcome.document().is_some());
        let errors: Vec<_> = outcome
            .diagnostics()
            .iter()
            .filter(|d| d.severity().is_error())
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "duplicate identifier: s1");
    }

    #[test]
    fn test_warnings_do_not_block_success() {
        let outcome = parse("<scxml/>", &ParseOptions::default());
        assert!(outcome.success());
        assert_eq!(outcome.diagnostics().len(), 1);
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_incomplete_input() {
        let lenient = parse("<scxml>\n  <state id=\"a\">\n  <tr", &ParseOptions::default());
        assert!(lenient.document().is_none());
        assert_eq!(lenient.diagnostics().len(), 1);
        assert_eq!(lenient.diagnostics()[0].code(), Some(ErrorCode::E101));

        let strict = parse(
            "<scxml>\n  <state id=\"a\">\n  <tr",
            &ParseOptions::default().with_strict(true),
        );
        assert_eq!(strict.diagnostics()[0].code(), Some(ErrorCode::E009));
    }
}
