//! Markup tokens produced by the lexer.

use crate::span::Span;

/// An attribute as written in a start tag; the value is still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<name attr="v">` or `<name attr="v"/>`.
    StartTag {
        name: &'a str,
        attributes: Vec<RawAttribute<'a>>,
        self_closing: bool,
    },
    /// `</name>`.
    EndTag(&'a str),
    /// Character data between tags, still escaped.
    Text(&'a str),
    CData(&'a str),
    Comment(&'a str),
    ProcessingInstruction(&'a str),
    /// `<!DOCTYPE ...>` and other declarations, without `<!` and `>`.
    Declaration(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}
