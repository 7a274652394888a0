//! Recursive layout solver.
//!
//! [`Solver::compute_layout`] lays out one composite state. Children are
//! split into three groups:
//!
//! 1. children with an explicit rectangle, which are never moved
//! 2. composite children, laid out recursively before being placed
//! 3. leaf children, packed by the configured [`LeafArrangement`]
//!
//! Composite children come first: side by side in rows of
//! `parallel_columns` inside a parallel state, one per row otherwise. Leaves
//! follow below them. When some children are pinned, placement starts below
//! the pinned ones so that nothing lands on top of them. The composite is
//! then sized to fit everything placed, explicit children included, plus
//! padding.

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;
use thiserror::Error;

use statecraft_core::{
    geometry::{Point, Size},
    visual::{self, LayoutPatch, LayoutRect, MetadataPatch},
};

use crate::{
    config::LayoutConfig,
    layout::{
        arrangement::{LeafArrangement, arrangement_for},
        graph::{LayoutGraph, LayoutNode},
    },
    metadata::MetadataTable,
};

/// Errors raised by the layout solver.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("unknown container `{0}`")]
    UnknownContainer(String),

    #[error("state `{0}` is its own ancestor")]
    Cycle(String),
}

/// Layout of one composite state.
///
/// `child_layouts` holds the rectangles the solver chose for the direct
/// children, relative to this composite. `nested` holds the layout of every
/// child that has children of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerLayout {
    pub width: f32,
    pub height: f32,
    pub child_layouts: IndexMap<String, LayoutRect>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub nested: IndexMap<String, ContainerLayout>,
}

impl ContainerLayout {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Every computed rectangle in the tree, keyed by state identifier.
    pub fn flatten(&self) -> IndexMap<String, LayoutRect> {
        let mut rects = IndexMap::new();
        self.collect_rects(&mut rects);
        rects
    }

    fn collect_rects(&self, rects: &mut IndexMap<String, LayoutRect>) {
        for (id, rect) in &self.child_layouts {
            rects.insert(id.clone(), *rect);
        }
        for nested in self.nested.values() {
            nested.collect_rects(rects);
        }
    }

    /// Store computed rectangles for states that have no layout record yet.
    ///
    /// Returns the number of records written.
    pub fn apply_to(&self, table: &mut MetadataTable) -> usize {
        let mut written = 0;
        for (id, rect) in self.flatten() {
            let known = table.get(&id).is_some_and(|record| record.layout.is_some());
            if !known {
                table.update(id, MetadataPatch::default().with_layout(LayoutPatch::rect(rect)));
                written += 1;
            }
        }
        written
    }
}

/// Computes layouts over one [`LayoutGraph`].
pub struct Solver<'g> {
    graph: &'g LayoutGraph,
    config: LayoutConfig,
    arrangement: Box<dyn LeafArrangement>,
}

impl<'g> Solver<'g> {
    /// Create a solver using the leaf policy named in `config`.
    pub fn new(graph: &'g LayoutGraph, config: &LayoutConfig) -> Self {
        Self {
            graph,
            config: config.clone(),
            arrangement: arrangement_for(config.policy()),
        }
    }

    /// Lay out the children of `container`, or the top-level states for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownContainer`] when `container` is not in
    /// the graph and [`LayoutError::Cycle`] when parent links loop.
    pub fn compute_layout(&self, container: Option<&str>) -> Result<ContainerLayout, LayoutError> {
        if let Some(id) = container {
            if self.graph.node(id).is_none() {
                return Err(LayoutError::UnknownContainer(id.to_string()));
            }
        }

        let mut ancestors = Vec::new();
        let layout = self.layout_container(container, &mut ancestors)?;

        debug!(
            container = container.unwrap_or("<root>"),
            width = layout.width,
            height = layout.height;
            "Layout computed"
        );
        trace!(layout:?; "Container layout");
        Ok(layout)
    }

    fn layout_container(
        &self,
        container: Option<&str>,
        ancestors: &mut Vec<String>,
    ) -> Result<ContainerLayout, LayoutError> {
        if let Some(id) = container {
            if ancestors.iter().any(|ancestor| ancestor == id) {
                return Err(LayoutError::Cycle(id.to_string()));
            }
            ancestors.push(id.to_string());
        }

        let mut explicit = Vec::new();
        let mut containers = Vec::new();
        let mut leaves = Vec::new();
        for child in self.graph.children(container) {
            if let Some(rect) = child.explicit() {
                explicit.push(rect.sanitized());
            } else if self.graph.has_children(child.id()) {
                containers.push(child);
            } else {
                leaves.push(child);
            }
        }

        // Explicit children keep their place but still get their content laid out.
        let mut nested = IndexMap::new();
        for child in self.graph.children(container) {
            if self.graph.has_children(child.id()) {
                let layout = self.layout_container(Some(child.id()), ancestors)?;
                nested.insert(child.id().to_string(), layout);
            }
        }

        let origin = Point::new(
            self.config.padding(),
            self.config.header_height() + self.config.padding(),
        );
        let mut child_layouts = IndexMap::new();

        let parallel = container
            .and_then(|id| self.graph.node(id))
            .is_some_and(LayoutNode::is_parallel);
        let columns = if parallel {
            self.config.parallel_columns()
        } else {
            1
        };

        let pinned = explicit
            .iter()
            .map(|rect| rect.to_bounds())
            .reduce(|acc, bounds| acc.merge(&bounds));
        let mut y = match pinned {
            Some(bounds) => origin.y().max(bounds.max_y() + self.config.spacing()),
            None => origin.y(),
        };
        for row in containers.chunks(columns) {
            let mut x = origin.x();
            let mut row_height: f32 = 0.0;
            for child in row {
                let size = nested
                    .get(child.id())
                    .map(ContainerLayout::size)
                    .unwrap_or_else(|| self.config.container_min());
                let rect = LayoutRect::from_parts(Point::new(x, y), size).sanitized();
                child_layouts.insert(child.id().to_string(), rect);
                x += size.width() + self.config.spacing();
                row_height = row_height.max(size.height());
            }
            y += row_height + self.config.spacing();
        }

        let placed = self
            .arrangement
            .arrange(&leaves, Point::new(origin.x(), y), &self.config);
        for (id, rect) in placed {
            child_layouts.insert(id, rect.sanitized());
        }

        let content = child_layouts
            .values()
            .chain(explicit.iter())
            .map(|rect| rect.to_bounds())
            .reduce(|acc, bounds| acc.merge(&bounds));
        let minimum = self.config.container_min();
        let size = match content {
            Some(bounds) => Size::new(
                bounds.max_x() + self.config.padding(),
                bounds.max_y() + self.config.padding(),
            )
            .max(minimum),
            None => minimum,
        };

        if container.is_some() {
            ancestors.pop();
        }

        trace!(
            container = container.unwrap_or("<root>"),
            containers = containers.len(),
            leaves = leaves.len(),
            explicit = explicit.len();
            "Laid out container"
        );

        Ok(ContainerLayout {
            width: visual::sanitize(size.width()),
            height: visual::sanitize(size.height()),
            child_layouts,
            nested,
        })
    }
}
