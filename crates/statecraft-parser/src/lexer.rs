//! Markup lexer.
//!
//! Splits already validated text into [`Token`]s: tags with their raw
//! attributes, character data, and the sections that are carried through
//! verbatim (comments, CDATA, processing instructions, declarations).
//! Entity references are left escaped here; the tree builder decodes them.
//!
//! The entry point is [`tokenize`]. Since the syntax validator has already
//! rejected malformed markup, the only way a token can fail to lex is an
//! unfinished construct at the end of the input, which is reported back as
//! the offset where lexing stopped.

use log::trace;
use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::{alt, delimited, opt, preceded, repeat},
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location},
    token::{one_of, take_till, take_until, take_while},
};

use crate::{
    span::Span,
    syntax::{is_name_char, is_name_start},
    tokens::{PositionedToken, RawAttribute, Token},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError>;

/// Parse a tag or attribute name.
fn name<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (one_of(is_name_start), take_while(0.., is_name_char))
        .take()
        .parse_next(input)
}

/// Parse a single or double quoted attribute value, without the quotes.
fn quoted_value<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

/// Parse an unquoted value. Only exempt visual attributes get this far.
fn unquoted_value<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_till(1.., |c: char| c.is_whitespace() || matches!(c, '>' | '/')).parse_next(input)
}

/// Parse `name="value"`, or a bare `name` which yields an empty value.
fn attribute<'a>(input: &mut Input<'a>) -> IResult<RawAttribute<'a>> {
    (
        preceded(multispace0, name),
        opt(preceded(
            (multispace0, '=', multispace0),
            alt((quoted_value, unquoted_value)),
        )),
    )
        .map(|(name, value)| RawAttribute {
            name,
            value: value.unwrap_or_default(),
        })
        .parse_next(input)
}

fn start_tag<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        preceded('<', name),
        repeat(0.., attribute),
        preceded(multispace0, alt(("/>".value(true), '>'.value(false)))),
    )
        .map(
            |(name, attributes, self_closing): (&'a str, Vec<RawAttribute<'a>>, bool)| {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                }
            },
        )
        .parse_next(input)
}

fn end_tag<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited("</", name, (multispace0, '>'))
        .map(Token::EndTag)
        .parse_next(input)
}

fn comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited("<!--", take_until(0.., "-->"), "-->")
        .map(Token::Comment)
        .parse_next(input)
}

fn cdata<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>")
        .map(Token::CData)
        .parse_next(input)
}

fn processing_instruction<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited("<?", take_until(0.., "?>"), "?>")
        .map(Token::ProcessingInstruction)
        .parse_next(input)
}

/// Parse `<!DOCTYPE ...>` including an optional `[...]` internal subset.
fn declaration<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited(
        "<!",
        (
            take_till(0.., ['[', '>']),
            opt(('[', take_until(0.., "]"), ']')),
            take_till(0.., '>'),
        )
            .take(),
        '>',
    )
    .map(Token::Declaration)
    .parse_next(input)
}

fn text<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_till(1.., '<').map(Token::Text).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        comment,                // Must come before declaration
        cdata,                  // Must come before declaration
        declaration,            // Must come before start tag
        processing_instruction, // Must come before start tag
        end_tag,                // Must come before start tag
        start_tag,
        text,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Result of lexing a whole input.
#[derive(Debug)]
pub struct Lexed<'a> {
    pub tokens: Vec<PositionedToken<'a>>,
    /// Offset of a trailing construct that could not be completed.
    pub incomplete_at: Option<usize>,
}

/// Split markup into tokens, stopping at a trailing unfinished construct.
pub fn tokenize(source: &str) -> Lexed<'_> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();

    while !input.is_empty() {
        let start = input.current_token_start();
        match positioned_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                trace!(offset = start; "Markup ends in an unfinished construct");
                return Lexed {
                    tokens,
                    incomplete_at: Some(start),
                };
            }
        }
    }

    Lexed {
        tokens,
        incomplete_at: None,
    }
}
