//! State-machine rules checked on a built document.
//!
//! Identifiers are collected into an index first; transition targets and
//! `initial` references are then resolved against it. Targets are weak
//! references, so a dangling one is only a warning.

use indexmap::IndexMap;
use log::debug;

use statecraft_core::{
    document::{Document, Element},
    semantic::{self, INITIAL, TRANSITION},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::Span,
};

/// Span covering the `<kind` of an element's start tag.
fn tag_span(element: &Element) -> Span {
    let start = element.offset().unwrap_or_default();
    Span::new(start..start + element.kind().len() + 1)
}

/// Returns the first element of every state identifier, in document order.
pub fn identifier_index(document: &Document) -> IndexMap<&str, &Element> {
    let mut index = IndexMap::new();
    for element in document.walk() {
        if !semantic::is_state_like(element.kind()) {
            continue;
        }
        if let Some(id) = element.id() {
            index.entry(id).or_insert(element);
        }
    }
    index
}

/// Apply state-machine rules and emit the findings to `collector`.
pub(crate) fn validate_document(document: &Document, collector: &mut DiagnosticCollector<'_>) {
    let root = document.root();
    let identifiers = identifier_index(document);

    for element in document.walk() {
        if !semantic::is_state_like(element.kind()) {
            continue;
        }

        let Some(id) = element.id() else {
            let diagnostic =
                Diagnostic::error(format!("<{}> element is missing an `id`", element.kind()))
                    .with_code(ErrorCode::E200)
                    .with_help("give every state a unique `id` attribute");
            collector.emit_at(tag_span(element), "state without identifier", diagnostic);
            continue;
        };

        let first = identifiers
            .get(id)
            .copied()
            .filter(|first| !std::ptr::eq(*first, element));
        if let Some(first) = first {
            let diagnostic = Diagnostic::error(format!("duplicate identifier: {id}"))
                .with_code(ErrorCode::E201)
                .with_secondary_label(tag_span(first), "first defined here")
                .with_help("rename one of the states");
            collector.emit_at(tag_span(element), "duplicate definition", diagnostic);
        }
    }

    let has_states = root
        .elements()
        .any(|child| semantic::is_state_like(child.kind()));
    if root.attribute("name").is_none() && root.attribute("initial").is_none() && !has_states {
        let diagnostic = Diagnostic::warning("empty state machine")
            .with_code(ErrorCode::E202)
            .with_help("add a state or give the machine a `name`");
        collector.emit_at(tag_span(root), "root has no states", diagnostic);
    }

    for element in document.walk() {
        if element.kind() == TRANSITION {
            for target in element.attribute("target").unwrap_or_default().split_whitespace() {
                if !identifiers.contains_key(target) {
                    let diagnostic = Diagnostic::warning(format!(
                        "transition target `{target}` does not match any state"
                    ))
                    .with_code(ErrorCode::E203);
                    collector.emit_at(tag_span(element), "dangling target", diagnostic);
                }
            }
        }

        if element.kind() != INITIAL {
            for initial in element.attribute("initial").unwrap_or_default().split_whitespace() {
                if !identifiers.contains_key(initial) {
                    let diagnostic = Diagnostic::warning(format!(
                        "initial state `{initial}` does not match any state"
                    ))
                    .with_code(ErrorCode::E204);
                    collector.emit_at(tag_span(element), "unknown initial state", diagnostic);
                }
            }
        }
    }

    debug!(identifiers = identifiers.len(); "Semantic validation finished");
}
