//! Builds the document tree from markup tokens.
//!
//! Elements are assembled on a stack: a start tag pushes, the matching end
//! tag pops and attaches the finished element to its parent. Top-level nodes
//! before and after the root become the document prolog and epilog.

use log::trace;

use statecraft_core::document::{Document, Element, Node, escape};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    lexer::Lexed,
    span::Span,
    tokens::{RawAttribute, Token},
};

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    /// Attach a finished node to the open element, or to the top level.
    fn attach(&mut self, node: Node, span: Span, collector: &mut DiagnosticCollector<'_>) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children_mut().push(node);
            return;
        }

        match node {
            Node::Element(element) if self.root.is_none() => self.root = Some(element),
            Node::Element(element) => {
                let diagnostic = Diagnostic::error(format!(
                    "multiple root elements: <{}> follows the root",
                    element.kind()
                ))
                .with_code(ErrorCode::E102)
                .with_help("wrap all states in a single root element");
                collector.emit_at(span, "extra root element", diagnostic);
            }
            Node::Text(text) if !text.chars().all(char::is_whitespace) => {
                let diagnostic = Diagnostic::error("text outside the root element")
                    .with_code(ErrorCode::E102)
                    .with_help(format!("move `{}` inside the root element", text.trim()));
                collector.emit_at(span, "stray text", diagnostic);
            }
            node if self.root.is_none() => self.prolog.push(node),
            node => self.epilog.push(node),
        }
    }
}

fn element_from_tag(name: &str, attributes: &[RawAttribute<'_>], offset: usize) -> Element {
    let mut element = Element::new(name).with_offset(offset);
    for attribute in attributes {
        element.set_attribute(attribute.name, escape::decode(attribute.value).into_owned());
    }
    element
}

/// Build a document from lexed tokens.
///
/// Returns `None` when no usable tree could be built; the reasons are
/// emitted to `collector`.
pub fn build_document(
    source: &str,
    lexed: Lexed<'_>,
    collector: &mut DiagnosticCollector<'_>,
) -> Option<Document> {
    let mut builder = TreeBuilder::default();

    for positioned in lexed.tokens {
        let span = positioned.span;
        match positioned.token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let element = element_from_tag(name, &attributes, span.start());
                if self_closing {
                    builder.attach(Node::Element(element), span, collector);
                } else {
                    builder.stack.push(element);
                }
            }
            Token::EndTag(name) => {
                let Some(element) = builder.stack.pop() else {
                    // Rejected by the syntax validator; kept total for direct callers.
                    collector.emit_at(
                        span,
                        "closing tag",
                        Diagnostic::error(format!("unexpected closing tag </{name}>"))
                            .with_code(ErrorCode::E002),
                    );
                    continue;
                };
                trace!(name; "Close element");
                builder.attach(Node::Element(element), span, collector);
            }
            Token::Text(raw) => {
                let text = escape::decode(raw).into_owned();
                builder.attach(Node::Text(text), span, collector);
            }
            Token::CData(content) => {
                builder.attach(Node::CData(content.to_string()), span, collector)
            }
            Token::Comment(content) => {
                builder.attach(Node::Comment(content.to_string()), span, collector)
            }
            Token::ProcessingInstruction(content) => builder.attach(
                Node::ProcessingInstruction(content.to_string()),
                span,
                collector,
            ),
            Token::Declaration(content) => {
                builder.attach(Node::Declaration(content.to_string()), span, collector)
            }
        }
    }

    if lexed.incomplete_at.is_some() || !builder.stack.is_empty() {
        let start = lexed
            .incomplete_at
            .or_else(|| builder.stack.last().and_then(Element::offset))
            .unwrap_or(source.len());
        let diagnostic = Diagnostic::error("incomplete document")
            .with_code(ErrorCode::E101)
            .with_help("finish the last tag and close every open element");
        collector.emit_at(Span::new(start..source.len()), "input ends here", diagnostic);
        return None;
    }

    let Some(root) = builder.root else {
        let diagnostic = Diagnostic::error("incomplete document: no root element")
            .with_code(ErrorCode::E101)
            .with_help("add a root element");
        collector.emit_at(Span::new(0..source.len()), "no element here", diagnostic);
        return None;
    };

    if collector.has_errors() {
        return None;
    }

    Some(Document::with_surroundings(
        builder.prolog,
        root,
        builder.epilog,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, span::LineIndex};

    fn build(source: &str) -> (Option<Document>, Vec<Diagnostic>) {
        let index = LineIndex::new(source);
        let mut collector = DiagnosticCollector::new(&index);
        let document = build_document(source, tokenize(source), &mut collector);
        (document, collector.into_diagnostics())
    }

    #[test]
    fn test_build_nested_tree() {
        let source = "<?xml version=\"1.0\"?>\n<scxml initial=\"a\">\n  <state id=\"a\"><final id=\"b\"/></state>\n</scxml>\n";
        let (document, diagnostics) = build(source);
        assert!(diagnostics.is_empty());

        let document = document.expect("document built");
        assert_eq!(document.prolog().len(), 2);
        assert_eq!(document.epilog(), &[Node::Text("\n".to_string())]);
        assert_eq!(document.root().kind(), "scxml");

        let a = document.find_by_id("a").expect("state a");
        assert_eq!(a.offset(), Some(44));
        assert_eq!(a.elements().next().map(Element::kind), Some("final"));
    }

    #[test]
    fn test_entities_are_decoded() {
        let (document, _) = build(r#"<scxml name="a &amp; b">x &lt; y &nbsp;</scxml>"#);
        let root = document.expect("document built");
        let root = root.root();
        assert_eq!(root.attribute("name"), Some("a & b"));
        assert_eq!(root.text().as_deref(), Some("x < y &nbsp;"));
    }

    #[test]
    fn test_multiple_roots() {
        let (document, diagnostics) = build("<scxml/><scxml/>");
        assert!(document.is_none());
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_stray_text() {
        let (document, diagnostics) = build("<scxml/> trailing");
        assert!(document.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_incomplete_document() {
        let (document, diagnostics) = build("<scxml>\n  <state id=\"a\">\n    <tran");
        assert!(document.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E101));
        assert_eq!(diagnostics[0].line(), Some(3));
    }

    #[test]
    fn test_empty_input() {
        let (document, diagnostics) = build("  \n");
        assert!(document.is_none());
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E101));
    }
}
