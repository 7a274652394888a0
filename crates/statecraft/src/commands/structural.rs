//! Commands that change the element tree.

use std::collections::HashSet;

use log::debug;

use statecraft_core::{
    document::{Element, Node},
    semantic::{self, FINAL, HISTORY, ON_ENTRY, ON_EXIT, ROOT, StateKind, TRANSITION},
};
use statecraft_parser::{ParseOptions, parse};

use super::{CommandError, Edit, EditContext, TransitionRef, normalize_tokens};

/// Give a state a new identifier, updating every reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameState {
    pub id: String,
    pub new_id: String,
}

impl RenameState {
    pub fn new(id: impl Into<String>, new_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            new_id: new_id.into(),
        }
    }
}

impl Edit for RenameState {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        if self.new_id.is_empty() || self.new_id.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidIdentifier(self.new_id.clone()));
        }
        if self.new_id == self.id {
            return context.state(&self.id).map(|_| ());
        }
        if context.count_states(&self.new_id) > 0 {
            return Err(CommandError::DuplicateIdentifier(self.new_id.clone()));
        }

        context
            .state_mut(&self.id)?
            .set_attribute("id", self.new_id.clone());

        let mut references = 0;
        context.document.root_mut().visit_mut(&mut |element| {
            if element.kind() == TRANSITION {
                references += rename_token(element, "target", &self.id, &self.new_id);
            }
            references += rename_token(element, "initial", &self.id, &self.new_id);
        });
        debug!(from = self.id, to = self.new_id, references; "Renamed state");
        Ok(())
    }
}

/// Change the kind of a state.
#[derive(Debug, Clone, PartialEq)]
pub struct RetypeState {
    pub id: String,
    pub kind: StateKind,
}

impl RetypeState {
    pub fn new(id: impl Into<String>, kind: StateKind) -> Self {
        Self { id: id.into(), kind }
    }

    fn invalid(&self, reason: &str) -> CommandError {
        CommandError::InvalidRetype {
            id: self.id.clone(),
            kind: self.kind,
            reason: reason.to_string(),
        }
    }
}

impl Edit for RetypeState {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        let state = context.state_mut(&self.id)?;
        if state.kind() == HISTORY {
            return Err(self.invalid("history states cannot be retyped"));
        }

        let has_child_states = state
            .elements()
            .any(|child| semantic::is_state_like(child.kind()));
        match self.kind {
            StateKind::Simple if has_child_states => {
                return Err(self.invalid("it has child states"));
            }
            StateKind::Final if has_child_states => {
                return Err(self.invalid("final states cannot contain child states"));
            }
            StateKind::Final if state.elements_of_kind(TRANSITION).next().is_some() => {
                return Err(self.invalid("final states cannot have outgoing transitions"));
            }
            _ => {}
        }

        let previous = state.kind().to_string();
        state.set_kind(self.kind.element_kind());
        if !matches!(self.kind, StateKind::Compound) {
            state.remove_attribute("initial");
        }
        debug!(id = self.id, from = previous, to:% = self.kind; "Retyped state");
        Ok(())
    }
}

/// Replace the entry and exit actions of a state.
///
/// `None` leaves a block alone; an empty fragment removes it. A fragment is
/// a sequence of executable-content elements, e.g. `<log expr="'hi'"/>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateActions {
    pub id: String,
    pub on_entry: Option<String>,
    pub on_exit: Option<String>,
}

impl UpdateActions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_on_entry(mut self, fragment: impl Into<String>) -> Self {
        self.on_entry = Some(fragment.into());
        self
    }

    pub fn with_on_exit(mut self, fragment: impl Into<String>) -> Self {
        self.on_exit = Some(fragment.into());
        self
    }
}

impl Edit for UpdateActions {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        let on_entry = self.on_entry.as_deref().map(parse_fragment).transpose()?;
        let on_exit = self.on_exit.as_deref().map(parse_fragment).transpose()?;

        let state = context.state_mut(&self.id)?;
        if let Some(nodes) = on_entry {
            replace_block(state, ON_ENTRY, nodes);
        }
        if let Some(nodes) = on_exit {
            replace_block(state, ON_EXIT, nodes);
        }
        debug!(id = self.id; "Updated actions");
        Ok(())
    }
}

/// Parse an action fragment into the nodes of a block body.
fn parse_fragment(fragment: &str) -> Result<Vec<Node>, CommandError> {
    if fragment.trim().is_empty() {
        return Ok(Vec::new());
    }
    let wrapped = format!("<{ROOT}>{fragment}</{ROOT}>");
    let document = parse(&wrapped, &ParseOptions::default())
        .into_result()
        .map_err(|err| CommandError::InvalidFragment(err.to_string()))?;
    Ok(document.root().children().to_vec())
}

/// Make `nodes` the only `kind` block of `state`, or drop the blocks when
/// `nodes` is empty.
fn replace_block(state: &mut Element, kind: &str, nodes: Vec<Node>) {
    let positions: Vec<usize> = state
        .children()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.as_element().is_some_and(|el| el.kind() == kind))
        .map(|(index, _)| index)
        .collect();

    let (first, rest) = match positions.split_first() {
        Some((first, rest)) if !nodes.is_empty() => (Some(*first), rest),
        _ => (None, positions.as_slice()),
    };
    for &index in rest.iter().rev() {
        state.remove_child_element(index);
    }

    match first {
        Some(index) => {
            if let Some(block) = state.children_mut()[index].as_element_mut() {
                *block.children_mut() = nodes;
            }
        }
        None if !nodes.is_empty() => {
            let mut block = Element::new(kind);
            *block.children_mut() = nodes;
            state.append_element(block);
        }
        None => {}
    }
}

/// Delete a state with its descendants.
///
/// Transitions elsewhere lose the deleted identifiers from their targets and
/// are dropped when no target is left; `initial` attributes are cleaned the
/// same way.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNode {
    pub id: String,
}

impl DeleteNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Edit for DeleteNode {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        if context.document.root().id() == Some(self.id.as_str()) {
            return Err(CommandError::RootProtected);
        }
        context.ensure_unique(&self.id)?;

        let removed = remove_state(context.document.root_mut(), &self.id)
            .ok_or_else(|| CommandError::ElementNotFound(self.id.clone()))?;
        let removed_ids: HashSet<&str> = removed
            .walk()
            .filter(|element| semantic::is_state_like(element.kind()))
            .filter_map(Element::id)
            .collect();

        let dropped = prune_references(context.document.root_mut(), &removed_ids);
        debug!(
            id = self.id,
            states = removed_ids.len(),
            dropped_transitions = dropped;
            "Deleted state"
        );
        Ok(())
    }
}

fn remove_state(element: &mut Element, id: &str) -> Option<Element> {
    let position = element.children().iter().position(|node| {
        node.as_element()
            .is_some_and(|el| semantic::is_state_like(el.kind()) && el.id() == Some(id))
    });
    if let Some(index) = position {
        return element.remove_child_element(index);
    }
    element
        .elements_mut()
        .find_map(|child| remove_state(child, id))
}

/// Drop references to `removed` below `element`; returns the number of
/// transitions dropped.
fn prune_references(element: &mut Element, removed: &HashSet<&str>) -> usize {
    strip_tokens(element, "initial", removed);

    let mut dropped = 0;
    let mut index = element.children().len();
    while index > 0 {
        index -= 1;
        let Some(child) = element.children_mut()[index].as_element_mut() else {
            continue;
        };
        if child.kind() == TRANSITION
            && strip_tokens(child, "target", removed)
            && child.attribute("target").is_none()
        {
            let indented = index > 0 && element.children()[index - 1].is_whitespace();
            element.remove_child_element(index);
            if indented {
                index -= 1;
            }
            dropped += 1;
            continue;
        }
        dropped += prune_references(child, removed);
    }
    dropped
}

/// Replace the token `from` by `to` in a whitespace-separated attribute.
fn rename_token(element: &mut Element, attribute: &str, from: &str, to: &str) -> usize {
    let Some(value) = element.attribute(attribute) else {
        return 0;
    };
    let count = value.split_whitespace().filter(|token| *token == from).count();
    if count > 0 {
        let renamed = value
            .split_whitespace()
            .map(|token| if token == from { to } else { token })
            .collect::<Vec<_>>()
            .join(" ");
        element.set_attribute(attribute, renamed);
    }
    count
}

/// Remove the `removed` tokens from a whitespace-separated attribute,
/// dropping the attribute once it is empty. Returns `true` on change.
fn strip_tokens(element: &mut Element, attribute: &str, removed: &HashSet<&str>) -> bool {
    let Some(value) = element.attribute(attribute) else {
        return false;
    };
    let kept: Vec<&str> = value
        .split_whitespace()
        .filter(|token| !removed.contains(token))
        .collect();
    if kept.len() == value.split_whitespace().count() {
        return false;
    }
    if kept.is_empty() {
        element.remove_attribute(attribute);
    } else {
        let kept = kept.join(" ");
        element.set_attribute(attribute, kept);
    }
    true
}

fn require_targets(context: &EditContext, target: &str) -> Result<(), CommandError> {
    if target.trim().is_empty() {
        return Err(CommandError::ElementNotFound(target.to_string()));
    }
    target
        .split_whitespace()
        .try_for_each(|token| context.ensure_unique(token))
}

/// Add a transition to the end of its source state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddTransition {
    pub source: String,
    pub target: String,
    pub event: Option<String>,
    pub condition: Option<String>,
}

impl AddTransition {
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
}

impl Edit for AddTransition {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        require_targets(context, &self.target)?;
        let source = context.state_mut(&self.source)?;
        if source.kind() == FINAL {
            return Err(CommandError::FinalSource(self.source.clone()));
        }

        let mut transition = Element::new(TRANSITION);
        if let Some(event) = &self.event {
            transition.set_attribute("event", event.clone());
        }
        if let Some(condition) = &self.condition {
            transition.set_attribute("cond", condition.clone());
        }
        transition.set_attribute("target", normalize_tokens(&self.target));
        source.append_element(transition);

        debug!(source = self.source, target = self.target; "Added transition");
        Ok(())
    }
}

/// Remove one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTransition {
    pub transition: TransitionRef,
}

impl DeleteTransition {
    pub fn new(transition: TransitionRef) -> Self {
        Self { transition }
    }
}

impl Edit for DeleteTransition {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        let index = context.transition_index(&self.transition)?;
        context
            .state_mut(&self.transition.source)?
            .remove_child_element(index)
            .ok_or_else(|| self.transition.not_found())?;
        debug!(source = self.transition.source, target = self.transition.target; "Deleted transition");
        Ok(())
    }
}

/// Change the event or condition of a transition.
///
/// `None` keeps the current value; an empty string removes the attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTransition {
    pub transition: TransitionRef,
    pub event: Option<String>,
    pub condition: Option<String>,
}

impl UpdateTransition {
    pub fn new(transition: TransitionRef) -> Self {
        Self {
            transition,
            event: None,
            condition: None,
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
}

fn set_or_remove(element: &mut Element, attribute: &str, value: Option<&str>) {
    match value {
        Some("") => {
            element.remove_attribute(attribute);
        }
        Some(value) => element.set_attribute(attribute, value),
        None => {}
    }
}

impl Edit for UpdateTransition {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        let index = context.transition_index(&self.transition)?;
        let source = context.state_mut(&self.transition.source)?;
        let transition = source.children_mut()[index]
            .as_element_mut()
            .ok_or_else(|| self.transition.not_found())?;

        set_or_remove(transition, "event", self.event.as_deref());
        set_or_remove(transition, "cond", self.condition.as_deref());
        Ok(())
    }
}

/// Move a transition to another source state, point it at another target,
/// or both.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectTransition {
    pub transition: TransitionRef,
    pub new_source: Option<String>,
    pub new_target: Option<String>,
}

impl ReconnectTransition {
    pub fn new(transition: TransitionRef) -> Self {
        Self {
            transition,
            new_source: None,
            new_target: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.new_source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.new_target = Some(target.into());
        self
    }
}

impl Edit for ReconnectTransition {
    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        let index = context.transition_index(&self.transition)?;
        if let Some(target) = &self.new_target {
            require_targets(context, target)?;
        }
        let destination = match &self.new_source {
            Some(source) if *source != self.transition.source => {
                if context.state(source)?.kind() == FINAL {
                    return Err(CommandError::FinalSource(source.clone()));
                }
                Some(source)
            }
            _ => None,
        };

        let source = context.state_mut(&self.transition.source)?;
        if let Some(target) = &self.new_target {
            if let Some(transition) = source.children_mut()[index].as_element_mut() {
                transition.set_attribute("target", normalize_tokens(target));
            }
        }

        if let Some(destination) = destination {
            let transition = source
                .remove_child_element(index)
                .ok_or_else(|| self.transition.not_found())?;
            context.state_mut(destination)?.append_element(transition);
        }

        debug!(
            source = self.transition.source,
            new_source:? = self.new_source,
            new_target:? = self.new_target;
            "Reconnected transition"
        );
        Ok(())
    }
}
