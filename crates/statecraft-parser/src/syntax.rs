//! Character-level markup validation.
//!
//! The validator walks the raw text once, keeping a stack of open tags, and
//! reports every malformed construct it meets without building a tree. It
//! runs before the structural parser so that broken input yields positioned
//! diagnostics instead of a single opaque failure.
//!
//! Comments, CDATA sections, processing instructions and declarations are
//! skipped without interpreting their content. When the input ends inside an
//! unfinished construct, lenient mode stays silent about it and about every
//! tag still open, since that is the normal state of a document being typed.

use std::collections::HashSet;

use log::{debug, trace};

use statecraft_core::{document::escape, visual::VISUAL_NAMESPACE};

use crate::{
    ParseOptions,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::{LineIndex, Span},
};

/// Returns `true` for characters that may start a tag or attribute name.
pub(crate) fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

/// Returns `true` for characters that may continue a tag or attribute name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

/// Validate markup syntax and return diagnostics in encounter order.
///
/// An empty result means the text is well-formed enough to be parsed into a
/// tree, except for a trailing incomplete construct tolerated in lenient
/// mode.
pub fn validate(text: &str, options: &ParseOptions) -> Vec<Diagnostic> {
    let index = LineIndex::new(text);
    let mut scanner = Scanner::new(text, options, &index);
    scanner.run();

    let diagnostics = scanner.collector.into_diagnostics();
    debug!(count = diagnostics.len(), strict = options.strict; "Syntax validation finished");
    diagnostics
}

/// A construct the input ended inside of.
#[derive(Debug, Clone, Copy)]
struct Incomplete {
    /// `None` for a tag, otherwise the kind of section.
    section: Option<&'static str>,
    start: usize,
}

impl Incomplete {
    fn tag(start: usize) -> Self {
        Self {
            section: None,
            start,
        }
    }

    fn section(name: &'static str, start: usize) -> Self {
        Self {
            section: Some(name),
            start,
        }
    }
}

/// A namespace prefix declared with `xmlns:prefix="..."`.
#[derive(Debug)]
struct Binding {
    prefix: String,
    visual: bool,
}

#[derive(Debug)]
struct OpenTag {
    name: String,
    /// Span of `<name` in the opening tag.
    span: Span,
    bindings: Vec<Binding>,
}

/// A diagnostic held back until the whole tag has been read, since a
/// namespace declaration later in the tag can exempt an earlier attribute.
struct Pending<'a> {
    prefix: Option<&'a str>,
    span: Span,
    label: &'static str,
    diagnostic: Diagnostic,
}

/// State gathered while reading the attributes of one opening tag.
#[derive(Default)]
struct TagScan<'a> {
    seen: HashSet<&'a str>,
    bindings: Vec<Binding>,
    pending: Vec<Pending<'a>>,
}

impl Pending<'_> {
    fn malformed(span: Span, message: String) -> Self {
        Self {
            prefix: None,
            span,
            label: "malformed here",
            diagnostic: Diagnostic::error(message).with_code(ErrorCode::E008),
        }
    }
}

/// Diagnostic for a bare `&` at `offset`; `rest` starts with that `&` and
/// ends where a reference may no longer extend.
fn invalid_reference(offset: usize, rest: &str) -> Option<Pending<'static>> {
    if escape::reference_at(rest).is_some() {
        return None;
    }
    Some(Pending {
        prefix: None,
        span: Span::new(offset..offset + 1),
        label: "bare `&`",
        diagnostic: Diagnostic::error("invalid entity reference")
            .with_code(ErrorCode::E006)
            .with_help("write `&amp;` for a literal ampersand"),
    })
}

enum TagEnd {
    Open,
    SelfClosing,
    /// Another `<` started before the tag was finished.
    Unterminated,
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    options: &'a ParseOptions,
    stack: Vec<OpenTag>,
    collector: DiagnosticCollector<'a>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, options: &'a ParseOptions, index: &'a LineIndex<'a>) -> Self {
        Self {
            text,
            pos: 0,
            options,
            stack: Vec::new(),
            collector: DiagnosticCollector::new(index),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_name(&mut self) -> &'a str {
        let start = self.pos;
        if self.peek().is_some_and(is_name_start) {
            self.bump();
            while self.peek().is_some_and(is_name_char) {
                self.bump();
            }
        }
        &self.text[start..self.pos]
    }

    /// Advance past `terminator`, or to the end of input if it never occurs.
    fn skip_past(&mut self, terminator: &str) -> bool {
        match self.rest().find(terminator) {
            Some(index) => {
                self.pos += index + terminator.len();
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    /// Whether attributes under `prefix` skip the quoting and duplicate checks.
    ///
    /// The innermost declaration of the prefix decides: it is exempt when
    /// bound to the visual namespace. An undeclared prefix is exempt when it
    /// is one of the reserved prefixes.
    fn is_exempt(&self, prefix: &str, own: &[Binding]) -> bool {
        own.iter()
            .rev()
            .chain(
                self.stack
                    .iter()
                    .rev()
                    .flat_map(|open| open.bindings.iter().rev()),
            )
            .find(|binding| binding.prefix == prefix)
            .map_or_else(
                || {
                    self.options
                        .reserved_prefixes
                        .iter()
                        .any(|reserved| reserved == prefix)
                },
                |binding| binding.visual,
            )
    }

    fn flush_tag(&mut self, tag: &mut TagScan<'a>) {
        for pending in std::mem::take(&mut tag.pending) {
            if pending
                .prefix
                .is_some_and(|prefix| self.is_exempt(prefix, &tag.bindings))
            {
                continue;
            }
            self.collector
                .emit_at(pending.span, pending.label, pending.diagnostic);
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let result = match c {
                '<' => self.scan_markup(),
                '&' => {
                    self.check_reference(self.pos, self.rest());
                    self.bump();
                    Ok(())
                }
                _ => {
                    self.bump();
                    Ok(())
                }
            };

            if let Err(incomplete) = result {
                self.finish_incomplete(incomplete);
                return;
            }
        }
        self.report_open_tags();
    }

    fn scan_markup(&mut self) -> Result<(), Incomplete> {
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with("<!--") {
            self.pos += "<!--".len();
            return self.require_terminator("-->", Incomplete::section("comment", start));
        }
        if rest.starts_with("<![CDATA[") {
            self.pos += "<![CDATA[".len();
            return self.require_terminator("]]>", Incomplete::section("CDATA section", start));
        }
        if rest.starts_with("<?") {
            self.pos += "<?".len();
            return self.require_terminator(
                "?>",
                Incomplete::section("processing instruction", start),
            );
        }
        if rest.starts_with("<!") {
            return self.scan_declaration(start);
        }
        if rest.starts_with("</") {
            return self.scan_closing_tag(start);
        }
        self.scan_opening_tag(start)
    }

    fn require_terminator(&mut self, terminator: &str, incomplete: Incomplete) -> Result<(), Incomplete> {
        if self.skip_past(terminator) {
            Ok(())
        } else {
            Err(incomplete)
        }
    }

    /// Skip a `<!...>` declaration, including a bracketed internal subset.
    fn scan_declaration(&mut self, start: usize) -> Result<(), Incomplete> {
        self.pos += "<!".len();
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(Incomplete::tag(start))
    }

    fn scan_closing_tag(&mut self, start: usize) -> Result<(), Incomplete> {
        self.pos += "</".len();
        let name = self.take_name();

        if name.is_empty() {
            if self.peek().is_none() {
                return Err(Incomplete::tag(start));
            }
            self.malformed(
                Span::new(start..self.pos),
                "closing tag has no name".to_string(),
            );
            return self.skip_to_tag_end(start);
        }

        self.skip_whitespace();
        match self.peek() {
            None => return Err(Incomplete::tag(start)),
            Some('>') => {
                self.bump();
            }
            Some(c) => {
                let at = self.pos;
                self.malformed(
                    Span::new(at..at + c.len_utf8()),
                    format!("unexpected character `{c}` in closing tag </{name}>"),
                );
                self.skip_to_tag_end(start)?;
            }
        }

        self.close(name, Span::new(start..self.pos));
        Ok(())
    }

    fn skip_to_tag_end(&mut self, start: usize) -> Result<(), Incomplete> {
        if self.skip_past(">") {
            Ok(())
        } else {
            Err(Incomplete::tag(start))
        }
    }

    fn close(&mut self, name: &str, span: Span) {
        let Some(index) = self.stack.iter().rposition(|open| open.name == name) else {
            let diagnostic = match self.stack.last() {
                None => Diagnostic::error(format!("unexpected closing tag </{name}>"))
                    .with_code(ErrorCode::E002)
                    .with_help("remove the closing tag or add a matching opening tag"),
                Some(top) => Diagnostic::error(format!(
                    "mismatched closing tag: expected </{}>",
                    top.name
                ))
                .with_code(ErrorCode::E003)
                .with_secondary_label(top.span, "innermost open tag"),
            };
            self.collector.emit_at(span, "closing tag", diagnostic);
            return;
        };

        let unclosed: Vec<OpenTag> = self.stack.drain(index + 1..).collect();
        self.stack.pop();
        for open in &unclosed {
            self.report_unclosed(open);
        }
    }

    fn scan_opening_tag(&mut self, start: usize) -> Result<(), Incomplete> {
        self.bump();
        let name = self.take_name();

        if name.is_empty() {
            match self.peek() {
                None => return Err(Incomplete::tag(start)),
                Some(_) => {
                    let diagnostic = Diagnostic::error("`<` does not start a valid tag")
                        .with_code(ErrorCode::E008)
                        .with_help("write `&lt;` for a literal less-than sign");
                    self.collector
                        .emit_at(Span::new(start..start + 1), "invalid tag start", diagnostic);
                    return Ok(());
                }
            }
        }

        let name_span = Span::new(start..self.pos);
        let mut tag = TagScan::default();
        let end = self.scan_tag_body(name, start, &mut tag);
        self.flush_tag(&mut tag);

        match end? {
            TagEnd::Open => {
                trace!(name, offset = start; "Open tag");
                self.stack.push(OpenTag {
                    name: name.to_string(),
                    span: name_span,
                    bindings: tag.bindings,
                });
            }
            TagEnd::SelfClosing => {}
            TagEnd::Unterminated => {
                let diagnostic = Diagnostic::error(format!("tag <{name}> is not terminated"))
                    .with_code(ErrorCode::E008)
                    .with_help("add `>` or `/>` to finish the tag");
                self.collector.emit_at(name_span, "tag starts here", diagnostic);
            }
        }
        Ok(())
    }

    fn scan_tag_body(
        &mut self,
        name: &str,
        start: usize,
        tag: &mut TagScan<'a>,
    ) -> Result<TagEnd, Incomplete> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return Err(Incomplete::tag(start));
            };

            match c {
                '>' => {
                    self.bump();
                    return Ok(TagEnd::Open);
                }
                '/' => {
                    self.bump();
                    match self.peek() {
                        Some('>') => {
                            self.bump();
                            return Ok(TagEnd::SelfClosing);
                        }
                        None => return Err(Incomplete::tag(start)),
                        Some(_) => tag.pending.push(Pending::malformed(
                            Span::new(self.pos - 1..self.pos),
                            format!("expected `>` after `/` in tag <{name}>"),
                        )),
                    }
                }
                '<' => return Ok(TagEnd::Unterminated),
                c if is_name_start(c) => self.scan_attribute(name, tag)?,
                c => {
                    let at = self.pos;
                    self.bump();
                    tag.pending.push(Pending::malformed(
                        Span::new(at..self.pos),
                        format!("unexpected character `{c}` in tag <{name}>"),
                    ));
                }
            }
        }
    }

    fn scan_attribute(&mut self, tag_name: &str, tag: &mut TagScan<'a>) -> Result<(), Incomplete> {
        let start = self.pos;
        let name = self.take_name();
        let name_span = Span::new(start..self.pos);
        let prefix = name.split_once(':').map(|(prefix, _)| prefix);

        if !tag.seen.insert(name) {
            tag.pending.push(Pending {
                prefix,
                span: name_span,
                label: "attribute repeated here",
                diagnostic: Diagnostic::error(format!(
                    "duplicate attribute `{name}` on <{tag_name}>"
                ))
                .with_code(ErrorCode::E005)
                .with_help("remove one of the duplicates"),
            });
        }

        self.skip_whitespace();
        match self.peek() {
            None => return Err(Incomplete::tag(start)),
            Some('=') => {
                self.bump();
            }
            Some(_) => {
                tag.pending.push(Pending {
                    prefix,
                    span: name_span,
                    label: "missing value",
                    diagnostic: Diagnostic::error(format!("attribute `{name}` has no value"))
                        .with_code(ErrorCode::E004)
                        .with_help(format!("write `{name}=\"...\"`")),
                });
                return Ok(());
            }
        }

        self.skip_whitespace();
        match self.peek() {
            None => Err(Incomplete::tag(start)),
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value_start = self.pos;
                match self.rest().find(quote) {
                    Some(len) => {
                        let value = &self.text[value_start..value_start + len];
                        for (index, _) in value.match_indices('&') {
                            tag.pending
                                .extend(invalid_reference(value_start + index, &value[index..]));
                        }
                        if let Some(declared) = name.strip_prefix("xmlns:") {
                            tag.bindings.push(Binding {
                                prefix: declared.to_string(),
                                visual: value == VISUAL_NAMESPACE,
                            });
                        }
                        self.pos = value_start + len + quote.len_utf8();
                        Ok(())
                    }
                    None => {
                        self.pos = self.text.len();
                        Err(Incomplete::tag(start))
                    }
                }
            }
            Some(_) => {
                let value_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && !matches!(c, '>' | '/'))
                {
                    self.bump();
                }
                tag.pending.push(Pending {
                    prefix,
                    span: Span::new(value_start..self.pos),
                    label: "unquoted value",
                    diagnostic: Diagnostic::error(format!("unquoted value for attribute `{name}`"))
                        .with_code(ErrorCode::E004)
                        .with_help("wrap the value in double or single quotes"),
                });
                Ok(())
            }
        }
    }

    fn check_reference(&mut self, offset: usize, rest: &str) {
        if let Some(pending) = invalid_reference(offset, rest) {
            self.collector
                .emit_at(pending.span, pending.label, pending.diagnostic);
        }
    }

    fn malformed(&mut self, span: Span, message: String) {
        let diagnostic = Diagnostic::error(message).with_code(ErrorCode::E008);
        self.collector.emit_at(span, "malformed here", diagnostic);
    }

    fn report_unclosed(&mut self, open: &OpenTag) {
        let diagnostic = Diagnostic::error(format!("unclosed tag <{}>", open.name))
            .with_code(ErrorCode::E001)
            .with_help(format!(
                "add `</{}>` or make the tag self-closing",
                open.name
            ));
        self.collector.emit_at(open.span, "opened here", diagnostic);
    }

    fn report_open_tags(&mut self) {
        let open_tags = std::mem::take(&mut self.stack);
        for open in &open_tags {
            self.report_unclosed(open);
        }
    }

    fn finish_incomplete(&mut self, incomplete: Incomplete) {
        if !self.options.strict {
            debug!(
                offset = incomplete.start,
                open_tags = self.stack.len();
                "Tolerating incomplete markup at end of input"
            );
            return;
        }

        let span = Span::new(incomplete.start..self.text.len());
        let diagnostic = match incomplete.section {
            Some(section) => Diagnostic::error(format!("unterminated {section}"))
                .with_code(ErrorCode::E007),
            None => Diagnostic::error("incomplete tag at end of input")
                .with_code(ErrorCode::E009),
        };
        self.collector.emit_at(span, "input ends here", diagnostic);
        self.report_open_tags();
    }
}
