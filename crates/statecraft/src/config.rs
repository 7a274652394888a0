//! Configuration types for Statecraft.
//!
//! This module provides configuration structures that control validation,
//! metadata defaults and the layout solver. All types implement
//! [`serde::Deserialize`] with per-field defaults, so a configuration file
//! only needs to name the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutConfig`] - Spacing, column counts and size floors for the solver.
//! - [`MetadataConfig`] - Fallback size for elements without a layout record.
//! - [`ValidationConfig`] - Strictness and reserved attribute prefixes.
//!
//! # Example
//!
//! ```
//! # use statecraft::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.metadata().default_size().width(), 160.0);
//! assert!(!config.validation().strict());
//! ```

use serde::Deserialize;

use statecraft_core::{geometry::Size, semantic::LayoutPolicy, visual::VISUAL_PREFIX};
use statecraft_parser::ParseOptions;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Layout solver section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Visual metadata section.
    #[serde(default)]
    metadata: MetadataConfig,

    /// Validation section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        layout: LayoutConfig,
        metadata: MetadataConfig,
        validation: ValidationConfig,
    ) -> Self {
        Self {
            layout,
            metadata,
            validation,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the metadata configuration.
    pub fn metadata(&self) -> &MetadataConfig {
        &self.metadata
    }

    /// Returns the validation configuration.
    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Returns a copy with the layout policy replaced.
    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.layout.policy = policy;
        self
    }

    /// Returns a copy with strict validation switched on or off.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.validation.strict = strict;
        self
    }
}

/// Tuning knobs for the hierarchical layout solver.
///
/// Every composite state reserves `header_height` above its content for the
/// state label; content then starts at `padding` from the remaining edges.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// How leaf states are packed inside a composite state.
    policy: LayoutPolicy,
    /// Space between a composite's border and its content.
    padding: f32,
    /// Space reserved above the content of a composite for its label.
    header_height: f32,
    /// Gap between rows and between columns.
    spacing: f32,
    /// Composite children per row inside a parallel state.
    parallel_columns: usize,
    /// Columns of the leaf grid.
    grid_columns: usize,
    /// Maximum leaves per row band in tiered mode.
    tier_columns: usize,
    /// Smallest size of any composite state.
    container_min_width: f32,
    container_min_height: f32,
    /// Width floor for leaf states.
    leaf_min_width: f32,
    /// Height floor for plain states.
    state_min_height: f32,
    /// Height floor for final and history states.
    terminal_min_height: f32,
    /// Extra height per entry or exit action.
    action_height: f32,
    /// Estimated width of one label character.
    char_width: f32,
    /// Horizontal room added around a label.
    label_padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            policy: LayoutPolicy::default(),
            padding: 20.0,
            header_height: 40.0,
            spacing: 20.0,
            parallel_columns: 3,
            grid_columns: 2,
            tier_columns: 4,
            container_min_width: 200.0,
            container_min_height: 120.0,
            leaf_min_width: 120.0,
            state_min_height: 80.0,
            terminal_min_height: 60.0,
            action_height: 16.0,
            char_width: 8.0,
            label_padding: 40.0,
        }
    }
}

impl LayoutConfig {
    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Composite children per row inside a parallel state, at least one.
    pub fn parallel_columns(&self) -> usize {
        self.parallel_columns.max(1)
    }

    /// Columns of the leaf grid, at least one.
    pub fn grid_columns(&self) -> usize {
        self.grid_columns.max(1)
    }

    /// Leaves per tier row band, at least one.
    pub fn tier_columns(&self) -> usize {
        self.tier_columns.max(1)
    }

    pub fn container_min(&self) -> Size {
        Size::new(self.container_min_width, self.container_min_height)
    }

    pub fn leaf_min_width(&self) -> f32 {
        self.leaf_min_width
    }

    pub fn state_min_height(&self) -> f32 {
        self.state_min_height
    }

    pub fn terminal_min_height(&self) -> f32 {
        self.terminal_min_height
    }

    pub fn action_height(&self) -> f32 {
        self.action_height
    }

    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    pub fn label_padding(&self) -> f32 {
        self.label_padding
    }

    /// Set the leaf packing policy.
    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Defaults applied by the metadata side table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Width given to a new layout record when none is known.
    default_width: f32,
    /// Height given to a new layout record when none is known.
    default_height: f32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            default_width: 160.0,
            default_height: 80.0,
        }
    }
}

impl MetadataConfig {
    /// Size used when a partial layout update creates a new record.
    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }
}

/// Options forwarded to the validator and parser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Report a trailing incomplete tag instead of tolerating it.
    strict: bool,
    /// Attribute prefixes exempt from quoting and duplicate checks.
    reserved_prefixes: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            reserved_prefixes: vec![VISUAL_PREFIX.to_string()],
        }
    }
}

impl ValidationConfig {
    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn reserved_prefixes(&self) -> &[String] {
        &self.reserved_prefixes
    }

    /// Parser options equivalent to this section.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_strict(self.strict)
            .with_reserved_prefixes(self.reserved_prefixes.clone())
    }
}
