//! Statecraft - validation, layout and round-trip safe editing for SCXML
//! state machines.
//!
//! Documents are parsed into a lossless element tree, visual metadata is kept
//! in a side table keyed by element, a hierarchical solver places states that
//! have no position yet, and edit commands rewrite the text without touching
//! markup they do not understand.
//!
//! # Pipeline
//!
//! ```text
//! Source text
//!     ↓ statecraft_parser::parse
//! Document ──→ metadata::extract_all ──→ MetadataTable
//!     ↓ layout::LayoutGraph::from_document
//! LayoutGraph
//!     ↓ layout::Solver::compute_layout
//! ContainerLayout ──→ apply_to ──→ MetadataTable
//!     ↓ metadata::serialize_with_metadata
//! Source text
//! ```

pub mod commands;
pub mod config;
pub mod layout;
pub mod metadata;

mod error;

pub use statecraft_core::{document, geometry, semantic, visual};
pub use statecraft_parser::{Diagnostic, ErrorCode, ParseError, ParseOutcome, Severity};

pub use error::StatecraftError;

use log::{debug, info, trace};

use document::Document;

use commands::{EditCommand, EditOutcome};
use config::AppConfig;
use layout::{ContainerLayout, LayoutGraph, Solver};
use metadata::{MetadataTable, SerializeOptions};

/// Entry point bundling the pipeline stages behind one configuration.
///
/// # Examples
///
/// ```rust
/// use statecraft::{Workbench, config::AppConfig};
///
/// let source = r#"<scxml initial="idle"><state id="idle"/></scxml>"#;
///
/// let workbench = Workbench::new(AppConfig::default());
/// let document = workbench.parse(source).expect("Failed to parse");
/// let metadata = workbench.metadata(source, &document);
/// let layout = workbench
///     .layout(&document, &metadata)
///     .expect("Failed to lay out");
/// assert!(layout.child_layouts.contains_key("idle"));
/// ```
#[derive(Debug, Default)]
pub struct Workbench {
    config: AppConfig,
}

impl Workbench {
    /// Create a workbench with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run every validation stage and return the outcome, diagnostics
    /// included, without failing.
    pub fn validate(&self, source: &str) -> ParseOutcome {
        let options = self.config.validation().parse_options();
        let outcome = statecraft_parser::parse(source, &options);
        debug!(
            success = outcome.success(),
            diagnostics = outcome.diagnostics().len();
            "Validated document"
        );
        outcome
    }

    /// Parse source text into a document.
    ///
    /// # Errors
    ///
    /// Returns [`StatecraftError::Parse`] carrying every diagnostic when any
    /// of them is an error.
    pub fn parse(&self, source: &str) -> Result<Document, StatecraftError> {
        info!("Parsing document");
        let document = self
            .validate(source)
            .into_result()
            .map_err(|err| StatecraftError::new_parse_error(err, source))?;
        trace!(elements = document.walk().count(); "Parsed document");
        Ok(document)
    }

    /// Extract the metadata table of `document`, parsed from `source`.
    pub fn metadata(&self, source: &str, document: &Document) -> MetadataTable {
        metadata::extract_all_from(source, document)
            .with_default_size(self.config.metadata().default_size())
    }

    /// Compute positions for the states of `document`.
    ///
    /// States that already have a layout record in `metadata` keep it.
    ///
    /// # Errors
    ///
    /// Returns [`StatecraftError::Layout`] if the solver fails.
    pub fn layout(
        &self,
        document: &Document,
        metadata: &MetadataTable,
    ) -> Result<ContainerLayout, StatecraftError> {
        info!(policy:% = self.config.layout().policy(); "Computing layout");
        let graph = LayoutGraph::from_document(document, metadata);
        let layout = Solver::new(&graph, self.config.layout()).compute_layout(None)?;
        debug!(width = layout.width, height = layout.height; "Layout computed");
        Ok(layout)
    }

    /// Lay out every unplaced state and return the document with the new
    /// positions written as visual attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to parse or the layout fails.
    pub fn auto_layout(&self, source: &str) -> Result<String, StatecraftError> {
        let document = self.parse(source)?;
        let mut table = self.metadata(source, &document);
        let layout = self.layout(&document, &table)?;
        let placed = layout.apply_to(&mut table);
        debug!(placed; "Placed states");
        Ok(metadata::serialize_with_metadata(
            &document,
            &table,
            SerializeOptions::default(),
        )?)
    }

    /// Serialize the document in `source`, with or without visual metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to parse.
    pub fn export(&self, source: &str, options: SerializeOptions) -> Result<String, StatecraftError> {
        let document = self.parse(source)?;
        let table = self.metadata(source, &document);
        Ok(metadata::serialize_with_metadata(&document, &table, options)?)
    }

    /// Apply one edit command to `source`.
    ///
    /// `metadata` is overlaid on the metadata already stored in `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StatecraftError::Command`] describing why the edit was
    /// rejected; `source` is never partially edited.
    pub fn apply(
        &self,
        source: &str,
        metadata: &MetadataTable,
        command: impl Into<EditCommand>,
    ) -> Result<EditOutcome, StatecraftError> {
        Ok(command.into().apply(source, metadata, &self.config)?)
    }
}
