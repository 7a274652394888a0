//! Hierarchical layout for nested states.
//!
//! The solver assigns a rectangle to every state that has no explicit
//! position, working bottom-up so that each composite state is sized by its
//! own content before its parent places it.
//!
//! # Pipeline Position
//!
//! ```text
//! Document + MetadataTable
//!     ↓ LayoutGraph::from_document
//! LayoutGraph
//!     ↓ Solver::compute_layout (this module)
//! ContainerLayout
//!     ↓ ContainerLayout::apply_to
//! MetadataTable
//! ```
//!
//! # Submodules
//!
//! - [`graph`] - The node collection the solver works on
//! - [`arrangement`] - Policies packing leaf states inside one composite
//! - [`solver`] - The recursive solver and its result tree
//!
//! Coordinates of a rectangle are relative to the enclosing composite state,
//! or to the document for top-level states.

pub mod arrangement;
pub mod graph;
pub mod solver;

pub use graph::{LayoutGraph, LayoutNode};
pub use solver::{ContainerLayout, LayoutError, Solver};
