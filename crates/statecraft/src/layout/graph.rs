//! The node collection consumed by the layout solver.
//!
//! A [`LayoutGraph`] is a snapshot: every node records its parent by
//! identifier, the data that drives its minimum size, and the rectangle it
//! already has, if any. Graphs are usually built from a parsed document and
//! its metadata table, but can be assembled node by node as well.

use indexmap::IndexMap;
use log::debug;

use statecraft_core::{
    document::{Document, Element},
    semantic::{self, FINAL, HISTORY, INITIAL, ON_ENTRY, ON_EXIT, PARALLEL, TRANSITION},
    visual::LayoutRect,
};

use crate::metadata::MetadataTable;

/// One state as seen by the layout solver.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    id: String,
    parent: Option<String>,
    kind: String,
    label: String,
    entry_actions: usize,
    exit_actions: usize,
    initial: bool,
    explicit: Option<LayoutRect>,
}

impl LayoutNode {
    /// Creates a node labelled with its identifier.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            parent: None,
            kind: kind.into(),
            entry_actions: 0,
            exit_actions: 0,
            initial: false,
            explicit: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the number of entry and exit actions.
    pub fn with_actions(mut self, entry: usize, exit: usize) -> Self {
        self.entry_actions = entry;
        self.exit_actions = exit;
        self
    }

    /// Mark the node as the initial state of its parent.
    pub fn with_initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    /// Give the node a rectangle the solver must not change.
    pub fn with_explicit(mut self, rect: LayoutRect) -> Self {
        self.explicit = Some(rect);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entry_actions(&self) -> usize {
        self.entry_actions
    }

    pub fn exit_actions(&self) -> usize {
        self.exit_actions
    }

    /// Entry plus exit actions.
    pub fn action_count(&self) -> usize {
        self.entry_actions + self.exit_actions
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn explicit(&self) -> Option<LayoutRect> {
        self.explicit
    }

    pub fn is_parallel(&self) -> bool {
        self.kind == PARALLEL
    }

    /// Final and history states, which are drawn smaller.
    pub fn is_terminal(&self) -> bool {
        self.kind == FINAL || self.kind == HISTORY
    }
}

/// States keyed by identifier, with child lists in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    nodes: IndexMap<String, LayoutNode>,
    roots: Vec<String>,
    children: IndexMap<String, Vec<String>>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns `false` and keeps the first node when the
    /// identifier is already present.
    pub fn add_node(&mut self, node: LayoutNode) -> bool {
        if self.nodes.contains_key(node.id()) {
            return false;
        }
        match node.parent() {
            Some(parent) => self
                .children
                .entry(parent.to_string())
                .or_default()
                .push(node.id().to_string()),
            None => self.roots.push(node.id().to_string()),
        }
        self.nodes.insert(node.id().to_string(), node);
        true
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.get(id)
    }

    /// Direct children of `parent`, or the top-level nodes for `None`.
    pub fn children(&self, parent: Option<&str>) -> impl Iterator<Item = &LayoutNode> {
        let ids = match parent {
            Some(parent) => self.children.get(parent).map(Vec::as_slice),
            None => Some(self.roots.as_slice()),
        };
        ids.unwrap_or_default()
            .iter()
            .filter_map(|id| self.nodes.get(id))
    }

    /// Returns `true` if any node names `id` as its parent.
    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|ids| !ids.is_empty())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build a graph from the states of a document.
    ///
    /// Nodes take their explicit rectangle from the layout record of the
    /// same key in `metadata`. States without an identifier cannot be keyed
    /// and are left out together with their descendants.
    pub fn from_document(document: &Document, metadata: &MetadataTable) -> Self {
        let mut graph = Self::new();
        collect_states(&mut graph, document.root(), None, metadata);
        debug!(nodes = graph.len(); "Built layout graph");
        graph
    }
}

fn collect_states(
    graph: &mut LayoutGraph,
    element: &Element,
    parent: Option<&str>,
    metadata: &MetadataTable,
) {
    let initial = initial_children(element);

    for child in element.elements() {
        if !semantic::is_state_like(child.kind()) {
            continue;
        }
        let Some(id) = child.id() else {
            continue;
        };

        let mut node = LayoutNode::new(id, child.kind())
            .with_actions(count_actions(child, ON_ENTRY), count_actions(child, ON_EXIT))
            .with_initial(initial.iter().any(|initial| *initial == id));
        if let Some(parent) = parent {
            node = node.with_parent(parent);
        }
        if let Some(rect) = metadata.get(id).and_then(|record| record.layout) {
            node = node.with_explicit(rect);
        }

        if graph.add_node(node) {
            collect_states(graph, child, Some(id), metadata);
        }
    }
}

/// Identifiers of the children entered by default when `element` is entered.
///
/// An `initial` attribute wins over an `<initial>` child; without either,
/// the first child state is initial. Parallel states enter every child, so
/// none is singled out.
fn initial_children(element: &Element) -> Vec<&str> {
    if element.kind() == PARALLEL {
        return Vec::new();
    }
    if let Some(initial) = element.attribute("initial") {
        return initial.split_whitespace().collect();
    }
    if let Some(pseudo) = element.elements_of_kind(INITIAL).next() {
        return pseudo
            .elements_of_kind(TRANSITION)
            .filter_map(|transition| transition.attribute("target"))
            .flat_map(str::split_whitespace)
            .collect();
    }
    element
        .elements()
        .find(|child| semantic::is_state_like(child.kind()))
        .and_then(Element::id)
        .into_iter()
        .collect()
}

fn count_actions(state: &Element, block: &str) -> usize {
    state
        .elements_of_kind(block)
        .map(|block| block.elements().count())
        .sum()
}
