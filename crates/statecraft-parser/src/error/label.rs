//! Spans of the markup that a diagnostic points at.

use crate::span::{LineIndex, Location, Span};

/// Whether a label marks the problem itself or a related place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The offending tag, attribute or reference.
    Primary,
    /// Context such as the first definition of a duplicated id or the tag
    /// an unmatched close belongs to.
    Secondary,
}

/// A message attached to a byte span of the markup.
///
/// ```text
/// error[E201]: duplicate identifier: s1
///   --> machine.scxml:3:5
///    |
///  2 |   <state id="s1">
///    |   --------------- first defined here
///  3 |     <state id="s1"/>
///    |     ^^^^^^^^^^^^^^^^ duplicate definition
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Secondary,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> LabelRole {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Primary
    }

    /// Line and column where the labelled markup starts.
    pub fn location(&self, index: &LineIndex<'_>) -> Location {
        index.location(self.span.start())
    }
}
