//! Error codes for the Statecraft diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Markup syntax errors
//! - `E1xx` - Document structure errors
//! - `E2xx` - State-machine semantic errors and warnings

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Syntax Errors (E0xx)
    // =========================================================================
    /// Unclosed tag.
    ///
    /// An opening tag was never closed before its parent closed or the
    /// input ended.
    E001,

    /// Unexpected closing tag.
    ///
    /// A closing tag was found while no tag was open.
    E002,

    /// Mismatched closing tag.
    ///
    /// A closing tag names an element that is not open anywhere.
    E003,

    /// Missing or unquoted attribute value.
    ///
    /// Attribute values must be wrapped in single or double quotes.
    E004,

    /// Duplicate attribute.
    ///
    /// The same attribute name appears twice on one tag.
    E005,

    /// Invalid entity reference.
    ///
    /// A bare `&` is not followed by `name;`, `#digits;` or `#xhex;`.
    E006,

    /// Unterminated comment, CDATA section or processing instruction.
    E007,

    /// Malformed tag.
    ///
    /// A `<` does not start a valid tag name, or a tag contains
    /// characters that cannot appear there.
    E008,

    /// Incomplete tag at end of input.
    ///
    /// Only reported in strict mode; lenient validation tolerates a trailing
    /// partial tag while text is being typed.
    E009,

    // =========================================================================
    // Structure Errors (E1xx)
    // =========================================================================
    /// Wrong root element.
    ///
    /// The document root must be the state-machine root element.
    E100,

    /// Incomplete document.
    ///
    /// The input ended before every element was closed, or contains no
    /// element at all.
    E101,

    /// Content outside the root element.
    ///
    /// A second root element or non-whitespace text appears at top level.
    E102,

    // =========================================================================
    // Semantic Errors and Warnings (E2xx)
    // =========================================================================
    /// Missing identifier.
    ///
    /// A state-like element has no `id` attribute.
    E200,

    /// Duplicate identifier.
    ///
    /// Two state-like elements share the same `id`.
    E201,

    /// Empty state machine.
    ///
    /// The root has no name, no initial state and no states.
    E202,

    /// Dangling transition target.
    ///
    /// A transition targets an identifier that no state carries.
    E203,

    /// Unknown initial state.
    ///
    /// An `initial` attribute names an identifier that no state carries.
    E204,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Syntax errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            ErrorCode::E008 => "E008",
            ErrorCode::E009 => "E009",
            // Structure errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            // Semantic errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Syntax errors
            ErrorCode::E001 => "unclosed tag",
            ErrorCode::E002 => "unexpected closing tag",
            ErrorCode::E003 => "mismatched closing tag",
            ErrorCode::E004 => "missing or unquoted attribute value",
            ErrorCode::E005 => "duplicate attribute",
            ErrorCode::E006 => "invalid entity reference",
            ErrorCode::E007 => "unterminated markup section",
            ErrorCode::E008 => "malformed tag",
            ErrorCode::E009 => "incomplete tag at end of input",
            // Structure errors
            ErrorCode::E100 => "wrong root element",
            ErrorCode::E101 => "incomplete document",
            ErrorCode::E102 => "content outside the root element",
            // Semantic errors
            ErrorCode::E200 => "missing identifier",
            ErrorCode::E201 => "duplicate identifier",
            ErrorCode::E202 => "empty state machine",
            ErrorCode::E203 => "dangling transition target",
            ErrorCode::E204 => "unknown initial state",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E204.to_string(), "E204");
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::E009.as_str(), "E009");
        assert_eq!(ErrorCode::E102.as_str(), "E102");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unclosed tag");
        assert_eq!(ErrorCode::E201.description(), "duplicate identifier");
        assert_eq!(ErrorCode::E203.description(), "dangling transition target");
    }
}
