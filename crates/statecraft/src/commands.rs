//! Edit commands.
//!
//! A command is applied to document text, never to a cached tree:
//!
//! 1. **Parse** - the text must parse without error diagnostics
//! 2. **Overlay** - metadata found in the text is overlaid with the caller's table
//! 3. **Inject** - the merged table is written onto the tree, so visual
//!    attributes travel with the elements that get moved or renamed
//! 4. **Change** - exactly one structural or metadata change is made
//! 5. **Serialize** - structural changes are re-validated; the resulting
//!    table is extracted from the edited tree
//!
//! Expected failures (unknown identifiers, ambiguous transitions, invalid
//! markup) are reported as [`CommandError`]s.

mod structural;
mod visual;

pub use structural::{
    AddTransition, DeleteNode, DeleteTransition, ReconnectTransition, RenameState, RetypeState,
    UpdateActions, UpdateTransition,
};
pub use visual::{UpdatePosition, UpdatePositionAndDimensions, UpdateStyle, UpdateWaypoints};

use log::{debug, info};
use thiserror::Error;

use statecraft_core::{
    document::{Document, Element},
    semantic::{self, StateKind, TRANSITION},
};
use statecraft_parser::{ParseError, parse};

use crate::{
    config::AppConfig,
    metadata::{self, MetadataError, MetadataTable},
};

/// Errors returned by edit commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("document failed to parse: {0}")]
    Parse(#[from] ParseError),

    #[error("element not found: `{0}`")]
    ElementNotFound(String),

    #[error("no transition from `{from}` to `{to}` matches")]
    TransitionNotFound { from: String, to: String },

    #[error("identifier `{0}` is used by more than one state")]
    AmbiguousElement(String),

    #[error("{count} transitions from `{from}` to `{to}` match, an occurrence index is required")]
    AmbiguousTransition {
        from: String,
        to: String,
        count: usize,
    },

    #[error("identifier `{0}` is already in use")]
    DuplicateIdentifier(String),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("cannot make `{id}` {kind}: {reason}")]
    InvalidRetype {
        id: String,
        kind: StateKind,
        reason: String,
    },

    #[error("final state `{0}` cannot have outgoing transitions")]
    FinalSource(String),

    #[error("invalid markup fragment: {0}")]
    InvalidFragment(String),

    #[error("the root element cannot be deleted")]
    RootProtected,

    #[error("failed to serialize the edited document: {0}")]
    Serialize(#[from] MetadataError),
}

/// Result of a successful edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The serialized document, metadata included.
    pub text: String,
    /// The metadata table of the edited document.
    pub metadata: MetadataTable,
}

/// Identifies a transition by its source, target, event and condition.
///
/// All four must match exactly; a missing event or condition only matches
/// a transition without that attribute. When several transitions match,
/// `occurrence` picks one of them by position in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRef {
    pub source: String,
    pub target: String,
    pub event: Option<String>,
    pub condition: Option<String>,
    pub occurrence: Option<usize>,
}

impl TransitionRef {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = Some(occurrence);
        self
    }

    fn matches(&self, element: &Element) -> bool {
        element.kind() == TRANSITION
            && metadata::normalized_target(element) == normalize_tokens(&self.target)
            && element.attribute("event") == self.event.as_deref()
            && element.attribute("cond") == self.condition.as_deref()
    }

    fn not_found(&self) -> CommandError {
        CommandError::TransitionNotFound {
            from: self.source.clone(),
            to: self.target.clone(),
        }
    }
}

/// Whitespace-separated tokens joined by single spaces.
fn normalize_tokens(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One change applied to an [`EditContext`].
trait Edit {
    /// Whether the change touches document structure, and so must be
    /// re-validated before it is returned.
    fn is_structural(&self) -> bool {
        true
    }

    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError>;
}

/// The tree and table a command works on.
struct EditContext {
    document: Document,
    metadata: MetadataTable,
}

impl EditContext {
    fn count_states(&self, id: &str) -> usize {
        self.document
            .walk()
            .filter(|element| semantic::is_state_like(element.kind()) && element.id() == Some(id))
            .count()
    }

    fn ensure_unique(&self, id: &str) -> Result<(), CommandError> {
        match self.count_states(id) {
            0 => Err(CommandError::ElementNotFound(id.to_string())),
            1 => Ok(()),
            _ => Err(CommandError::AmbiguousElement(id.to_string())),
        }
    }

    /// The only state carrying `id`.
    fn state(&self, id: &str) -> Result<&Element, CommandError> {
        self.ensure_unique(id)?;
        self.document
            .walk()
            .find(|element| semantic::is_state_like(element.kind()) && element.id() == Some(id))
            .ok_or_else(|| CommandError::ElementNotFound(id.to_string()))
    }

    /// The only state carrying `id`, mutably.
    fn state_mut(&mut self, id: &str) -> Result<&mut Element, CommandError> {
        self.ensure_unique(id)?;
        find_state_mut(self.document.root_mut(), id)
            .ok_or_else(|| CommandError::ElementNotFound(id.to_string()))
    }

    /// Index, among the children of its source, of the referenced transition.
    fn transition_index(&self, reference: &TransitionRef) -> Result<usize, CommandError> {
        let source = self.state(&reference.source)?;
        let matches: Vec<usize> = source
            .children()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.as_element().is_some_and(|el| reference.matches(el)))
            .map(|(index, _)| index)
            .collect();

        match (matches.len(), reference.occurrence) {
            (0, _) => Err(reference.not_found()),
            (_, Some(occurrence)) => matches
                .get(occurrence)
                .copied()
                .ok_or_else(|| reference.not_found()),
            (1, None) => Ok(matches[0]),
            (count, None) => Err(CommandError::AmbiguousTransition {
                from: reference.source.clone(),
                to: reference.target.clone(),
                count,
            }),
        }
    }

    /// Fail unless some element of the document has side-table key `key`.
    fn require_key(&self, key: &str) -> Result<(), CommandError> {
        let known = metadata::element_keys(&self.document)
            .into_iter()
            .flatten()
            .any(|known| known == key);
        if known {
            Ok(())
        } else {
            Err(CommandError::ElementNotFound(key.to_string()))
        }
    }
}

fn find_state_mut<'a>(element: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    if semantic::is_state_like(element.kind()) && element.id() == Some(id) {
        return Some(element);
    }
    element
        .elements_mut()
        .find_map(|child| find_state_mut(child, id))
}

macro_rules! edit_commands {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Every edit the engine supports.
        #[derive(Debug, Clone, PartialEq)]
        pub enum EditCommand {
            $($variant($variant),)*
        }

        impl EditCommand {
            /// Kebab-case command name, as used in logs.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $name,)*
                }
            }

            fn as_edit(&self) -> &dyn Edit {
                match self {
                    $(Self::$variant(command) => command,)*
                }
            }
        }

        $(
            impl From<$variant> for EditCommand {
                fn from(command: $variant) -> Self {
                    Self::$variant(command)
                }
            }
        )*
    };
}

edit_commands! {
    RenameState => "rename-state",
    RetypeState => "retype-state",
    UpdateActions => "update-actions",
    DeleteNode => "delete-node",
    AddTransition => "add-transition",
    DeleteTransition => "delete-transition",
    UpdateTransition => "update-transition",
    ReconnectTransition => "reconnect-transition",
    UpdatePosition => "update-position",
    UpdatePositionAndDimensions => "update-position-and-dimensions",
    UpdateWaypoints => "update-waypoints",
    UpdateStyle => "update-style",
}

impl EditCommand {
    /// Returns `true` for commands that change document structure.
    pub fn is_structural(&self) -> bool {
        self.as_edit().is_structural()
    }

    /// Apply the command to `text`.
    ///
    /// `metadata` is overlaid on the metadata already present in `text`, so
    /// callers can pass an empty table or the table returned by a previous
    /// edit.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Parse`] when `text` does not parse cleanly,
    /// a lookup error when the target cannot be identified, and
    /// [`CommandError::Serialize`] when a structural change produced a
    /// document that no longer validates.
    pub fn apply(
        &self,
        text: &str,
        metadata: &MetadataTable,
        config: &AppConfig,
    ) -> Result<EditOutcome, CommandError> {
        info!(command = self.name(); "Applying edit");
        let edit = self.as_edit();
        let options = config.validation().parse_options();
        let default_size = config.metadata().default_size();

        let mut document = parse(text, &options).into_result()?;
        let mut table = metadata::extract_all_from(text, &document).with_default_size(default_size);
        table.merge(metadata);
        metadata::inject(&mut document, &table, true);

        let mut context = EditContext {
            document,
            metadata: table,
        };
        edit.execute(&mut context)?;

        let EditContext {
            mut document,
            metadata: table,
        } = context;
        if !edit.is_structural() {
            metadata::inject(&mut document, &table, true);
        }

        let text = document.to_xml();
        if edit.is_structural() {
            parse(&text, &options)
                .into_result()
                .map_err(|err| CommandError::Serialize(MetadataError::InvalidOutput(err)))?;
        }

        let metadata = metadata::extract_all_from(&text, &document).with_default_size(default_size);
        debug!(
            command = self.name(),
            len = text.len(),
            entries = metadata.len();
            "Edit applied"
        );
        Ok(EditOutcome { text, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACHINE: &str = r#"<scxml initial="idle">
  <state id="idle">
    <transition event="go" target="busy"/>
    <transition event="go" target="busy"/>
    <transition event="go" cond="ready" target="busy"/>
  </state>
  <state id="busy"/>
</scxml>"#;

    fn context(source: &str) -> EditContext {
        EditContext {
            document: parse(source, &Default::default())
                .into_result()
                .expect("Failed to parse"),
            metadata: MetadataTable::new(),
        }
    }

    #[test]
    fn test_transition_matching_compares_all_fields() {
        let context = context(MACHINE);

        let guarded = TransitionRef::new("idle", "busy")
            .with_event("go")
            .with_condition("ready");
        assert_eq!(context.transition_index(&guarded).expect("match"), 5);

        let plain = TransitionRef::new("idle", "busy").with_event("go");
        assert!(matches!(
            context.transition_index(&plain),
            Err(CommandError::AmbiguousTransition { count: 2, .. })
        ));
        assert_eq!(
            context
                .transition_index(&plain.clone().with_occurrence(1))
                .expect("second match"),
            3
        );
        assert!(matches!(
            context.transition_index(&plain.with_occurrence(2)),
            Err(CommandError::TransitionNotFound { .. })
        ));

        let eventless = TransitionRef::new("idle", "busy");
        assert!(matches!(
            context.transition_index(&eventless),
            Err(CommandError::TransitionNotFound { .. })
        ));
    }

    #[test]
    fn test_state_lookup() {
        let context = context(r#"<scxml><state id="a"><state id="b"/></state><final id="c"/></scxml>"#);
        assert_eq!(context.state("b").map(Element::kind).ok(), Some("state"));
        assert!(matches!(
            context.state("zzz"),
            Err(CommandError::ElementNotFound(id)) if id == "zzz"
        ));
        assert!(context.require_key("c").is_ok());
        assert!(context.require_key("a->b#0").is_err());
    }

    #[test]
    fn test_names_and_kinds() {
        let rename: EditCommand = RenameState::new("a", "b").into();
        assert_eq!(rename.name(), "rename-state");
        assert!(rename.is_structural());

        let position: EditCommand = UpdatePosition::new("a", 1.0, 2.0).into();
        assert_eq!(position.name(), "update-position");
        assert!(!position.is_structural());
    }

    #[test]
    fn test_unparsable_text_is_rejected() {
        let command: EditCommand = RenameState::new("a", "b").into();
        let result = command.apply(
            "<scxml><state id=\"a\"></scxml>",
            &MetadataTable::new(),
            &AppConfig::default(),
        );
        assert!(matches!(result, Err(CommandError::Parse(_))));
    }
}
