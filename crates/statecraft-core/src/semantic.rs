//! State-machine vocabulary shared by the parser, layout solver and editor.
//!
//! The document tree itself is generic (see [`crate::document`]); this module
//! names the element kinds that carry state-machine meaning and the enums
//! selecting how those states are arranged.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Kind of the required document root.
pub const ROOT: &str = "scxml";
/// Atomic or compound state.
pub const STATE: &str = "state";
/// State whose children are all active at once.
pub const PARALLEL: &str = "parallel";
/// Terminal state.
pub const FINAL: &str = "final";
/// History pseudo-state.
pub const HISTORY: &str = "history";
/// Transition between states.
pub const TRANSITION: &str = "transition";
/// Executable content run on entering a state.
pub const ON_ENTRY: &str = "onentry";
/// Executable content run on leaving a state.
pub const ON_EXIT: &str = "onexit";
/// Initial pseudo-state wrapper.
pub const INITIAL: &str = "initial";

/// Returns `true` for element kinds that carry a state identifier.
pub fn is_state_like(kind: &str) -> bool {
    matches!(kind, STATE | PARALLEL | FINAL | HISTORY)
}

/// The structural flavour of a state, as exposed to editing commands.
///
/// `Simple` and `Compound` share the `state` element kind; they differ only in
/// whether child states are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Simple,
    Compound,
    Parallel,
    Final,
}

impl StateKind {
    /// Returns the element kind used to encode this state.
    pub fn element_kind(self) -> &'static str {
        match self {
            Self::Simple | Self::Compound => STATE,
            Self::Parallel => PARALLEL,
            Self::Final => FINAL,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Compound => "compound",
            Self::Parallel => "parallel",
            Self::Final => "final",
        };
        f.write_str(name)
    }
}

impl FromStr for StateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "compound" => Ok(Self::Compound),
            "parallel" => Ok(Self::Parallel),
            "final" => Ok(Self::Final),
            _ => Err(format!(
                "invalid state kind `{s}`, valid values: simple, compound, parallel, final"
            )),
        }
    }
}

/// Policy used to arrange leaf states inside a composite state.
///
/// Composite children are always stacked (or placed side by side inside a
/// parallel state); the policy only affects how simple children are packed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPolicy {
    /// Fixed-column grid with uniform cells.
    #[default]
    Grid,
    /// Row bands grouped by action complexity, sorted by category.
    Tiered,
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Tiered => write!(f, "tiered"),
        }
    }
}

impl FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "tiered" => Ok(Self::Tiered),
            _ => Err(format!(
                "invalid layout policy `{s}`, valid values: grid, tiered"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_like_kinds() {
        assert!(is_state_like("state"));
        assert!(is_state_like("parallel"));
        assert!(is_state_like("final"));
        assert!(is_state_like("history"));
        assert!(!is_state_like("transition"));
        assert!(!is_state_like("scxml"));
    }

    #[test]
    fn test_state_kind_roundtrip() {
        for kind in [
            StateKind::Simple,
            StateKind::Compound,
            StateKind::Parallel,
            StateKind::Final,
        ] {
            assert_eq!(kind.to_string().parse::<StateKind>(), Ok(kind));
        }
        assert!("atomic".parse::<StateKind>().is_err());
    }

    #[test]
    fn test_state_kind_element_kind() {
        assert_eq!(StateKind::Simple.element_kind(), "state");
        assert_eq!(StateKind::Compound.element_kind(), "state");
        assert_eq!(StateKind::Parallel.element_kind(), "parallel");
        assert_eq!(StateKind::Final.element_kind(), "final");
    }

    #[test]
    fn test_layout_policy_parse() {
        assert_eq!("grid".parse::<LayoutPolicy>(), Ok(LayoutPolicy::Grid));
        assert_eq!("tiered".parse::<LayoutPolicy>(), Ok(LayoutPolicy::Tiered));
        assert!("force".parse::<LayoutPolicy>().is_err());
        assert_eq!(LayoutPolicy::default(), LayoutPolicy::Grid);
    }
}
