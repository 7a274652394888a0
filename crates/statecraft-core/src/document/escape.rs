//! Entity decoding and escaping for text and attribute values.
//!
//! The five predefined entities and numeric character references are decoded.
//! Other named references (for example `&nbsp;` declared by a DTD) are kept
//! verbatim in the decoded value and are not escaped again on output, so that
//! they survive a round trip unchanged.

use std::borrow::Cow;

/// The longest entity name considered when scanning for a reference.
const MAX_REFERENCE_LEN: usize = 32;

/// A character or entity reference found at the start of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// A predefined or numeric reference resolving to a character.
    Char(char),
    /// A syntactically valid named reference with no known expansion.
    Unknown,
}

/// Classify the reference at the start of `input`, which must begin with `&`.
///
/// Returns the reference and its length in bytes including `&` and `;`, or
/// `None` if the text is not a well-formed reference.
pub fn reference_at(input: &str) -> Option<(Reference, usize)> {
    let rest = input.strip_prefix('&')?;
    let end = rest
        .char_indices()
        .take(MAX_REFERENCE_LEN)
        .find(|&(_, c)| c == ';')
        .map(|(index, _)| index)?;
    let name = &rest[..end];
    let len = end + 2;

    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| (Reference::Char(c), len));
    }

    let reference = match name {
        "amp" => Reference::Char('&'),
        "lt" => Reference::Char('<'),
        "gt" => Reference::Char('>'),
        "quot" => Reference::Char('"'),
        "apos" => Reference::Char('\''),
        _ if is_name(name) => Reference::Unknown,
        _ => return None,
    };
    Some((reference, len))
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

/// Decode character and entity references in raw markup text.
///
/// Malformed references are kept as written; the syntax validator reports them.
pub fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(index) = rest.find('&') {
        decoded.push_str(&rest[..index]);
        rest = &rest[index..];
        match reference_at(rest) {
            Some((Reference::Char(c), len)) => {
                decoded.push(c);
                rest = &rest[len..];
            }
            Some((Reference::Unknown, len)) => {
                decoded.push_str(&rest[..len]);
                rest = &rest[len..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, true)
}

/// Escape character data for use between tags.
pub fn escape_text(value: &str) -> Cow<'_, str> {
    escape(value, false)
}

fn escape(value: &str, in_attribute: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| match c {
        '&' | '<' => true,
        '"' | '\t' | '\n' | '\r' => in_attribute,
        _ => false,
    };
    if !value.contains(needs_escape) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for (index, c) in value.char_indices() {
        match c {
            '&' if matches!(reference_at(&value[index..]), Some((Reference::Unknown, _))) => {
                escaped.push('&');
            }
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            '\t' if in_attribute => escaped.push_str("&#9;"),
            '\n' if in_attribute => escaped.push_str("&#10;"),
            '\r' if in_attribute => escaped.push_str("&#13;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_predefined() {
        assert_eq!(decode("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(decode("&quot;x&apos;"), "\"x'");
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(decode("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode("line&#10;break"), "line\nbreak");
    }

    #[test]
    fn test_decode_keeps_unknown_and_malformed() {
        assert_eq!(decode("a&nbsp;b"), "a&nbsp;b");
        assert_eq!(decode("fish & chips"), "fish & chips");
        assert_eq!(decode("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn test_decode_borrows_plain_text() {
        assert!(matches!(decode("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_attribute("x\ny\tz"), "x&#10;y&#9;z");
        assert_eq!(escape_attribute("x > y"), "x > y");
    }

    #[test]
    fn test_escape_text_leaves_quotes() {
        assert_eq!(escape_text("say \"hi\" & <bye>"), "say \"hi\" &amp; &lt;bye>");
        assert_eq!(escape_text("tab\there"), "tab\there");
    }

    #[test]
    fn test_unknown_entity_survives_round_trip() {
        let raw = "copyright &copy; 2024";
        let decoded = decode(raw);
        assert_eq!(escape_text(&decoded), raw);
        assert_eq!(escape_attribute(&decoded), raw);
    }

    #[test]
    fn test_reference_at() {
        assert_eq!(reference_at("&amp;rest"), Some((Reference::Char('&'), 5)));
        assert_eq!(reference_at("&foo;"), Some((Reference::Unknown, 5)));
        assert_eq!(reference_at("& x"), None);
        assert_eq!(reference_at("&1abc;"), None);
    }

    fn check_attribute_round_trip(value: &str) {
        let escaped = escape_attribute(value);
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('<'));
        assert_eq!(decode(&escaped), value);
    }

    fn check_text_round_trip(value: &str) {
        let escaped = escape_text(value);
        assert!(!escaped.contains('<'));
        assert_eq!(decode(&escaped), value);
    }

    proptest! {
        #[test]
        fn attribute_escape_round_trips(value in "[a-z<>&\"' \t\n]{0,24}") {
            check_attribute_round_trip(&value);
        }

        #[test]
        fn text_escape_round_trips(value in "[a-z<>&\"' ]{0,24}") {
            check_text_round_trip(&value);
        }
    }
}
