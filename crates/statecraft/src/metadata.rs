//! Visual metadata side table.
//!
//! Presentation data travels inside the document as attributes under a
//! prefix bound to [`VISUAL_NAMESPACE`]. This module lifts those attributes
//! into a [`MetadataTable`] keyed by element, and writes a table back onto a
//! tree right before serialization. Structure is never read from the table.
//!
//! # Keys
//!
//! States and other elements with an `id` are keyed by that identifier.
//! Transitions have no identifier of their own and are keyed by
//! `"{source}->{target}#{n}"`, where `n` counts earlier transitions of the
//! same source with the same target, in document order.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::Serialize;
use thiserror::Error;

use statecraft_core::{
    document::{Document, Element},
    geometry::Size,
    semantic::{self, TRANSITION},
    visual::{
        self, ATTR_CURVE, ATTR_STROKE, ATTR_STROKE_WIDTH, ATTR_WAYPOINTS, ATTR_XYWH, CurveType,
        DiagramData, LayoutRect, MetadataPatch, StrokeStyle, VISUAL_NAMESPACE, VISUAL_PREFIX,
        VisualMetadata,
    },
};
use statecraft_parser::{ParseError, ParseOptions};

const XMLNS_PREFIX: &str = "xmlns:";

/// Errors raised while writing metadata back into a document.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("serialized document failed validation: {0}")]
    InvalidOutput(ParseError),
}

/// Build the side-table key of a transition.
pub fn transition_key(source: &str, target: &str, ordinal: usize) -> String {
    format!("{source}->{target}#{ordinal}")
}

/// Cheap check for whether a text mentions the visual namespace at all.
///
/// A document whose text fails this check carries no visual metadata, so
/// [`extract_all_from`] skips walking its tree.
pub fn uses_visual_namespace(text: &str) -> bool {
    text.contains(VISUAL_NAMESPACE)
}

/// Prefixes bound to the visual namespace anywhere in the document.
pub fn visual_prefixes(document: &Document) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for element in document.walk() {
        for (name, value) in element.attributes() {
            let Some(prefix) = name.strip_prefix(XMLNS_PREFIX) else {
                continue;
            };
            if value == VISUAL_NAMESPACE && !prefixes.iter().any(|known| known == prefix) {
                prefixes.push(prefix.to_string());
            }
        }
    }
    prefixes
}

/// Prefix to write visual attributes under.
///
/// This is [`VISUAL_PREFIX`] unless the document binds it to another
/// namespace somewhere, in which case the first free `viz1`, `viz2`, ... is
/// used so that foreign attributes keep their meaning.
pub fn output_prefix(document: &Document) -> String {
    let foreign: HashSet<&str> = document
        .walk()
        .flat_map(|element| element.attributes())
        .filter(|(_, value)| value.as_str() != VISUAL_NAMESPACE)
        .filter_map(|(name, _)| name.strip_prefix(XMLNS_PREFIX))
        .collect();

    if !foreign.contains(VISUAL_PREFIX) {
        return VISUAL_PREFIX.to_string();
    }
    let mut ordinal = 1usize;
    loop {
        let candidate = format!("{VISUAL_PREFIX}{ordinal}");
        if !foreign.contains(candidate.as_str()) {
            return candidate;
        }
        ordinal += 1;
    }
}

/// Side-table key of every element, in document order.
///
/// The result lines up with [`Document::walk`] and with
/// [`Element::visit_mut`] on the root; unkeyed elements get `None`.
pub fn element_keys(document: &Document) -> Vec<Option<String>> {
    let mut keys = Vec::new();
    let mut ordinals = HashMap::new();
    collect_keys(document.root(), None, &mut ordinals, &mut keys);
    keys
}

fn collect_keys<'a>(
    element: &'a Element,
    source: Option<&'a str>,
    ordinals: &mut HashMap<(&'a str, String), usize>,
    keys: &mut Vec<Option<String>>,
) {
    let key = if element.kind() == TRANSITION {
        source.map(|source| {
            let target = normalized_target(element);
            let ordinal = ordinals.entry((source, target.clone())).or_default();
            let key = transition_key(source, &target, *ordinal);
            *ordinal += 1;
            key
        })
    } else {
        element.id().map(str::to_string)
    };
    keys.push(key);

    let source = if semantic::is_state_like(element.kind()) {
        element.id().or(source)
    } else {
        source
    };
    for child in element.elements() {
        collect_keys(child, source, ordinals, keys);
    }
}

/// Target tokens of a transition joined by single spaces.
pub(crate) fn normalized_target(transition: &Element) -> String {
    transition
        .attribute("target")
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A problem with a stored value that is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataIssue {
    pub key: String,
    pub message: String,
}

impl fmt::Display for MetadataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Visual metadata for the elements of one document, keyed by element key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataTable {
    entries: IndexMap<String, VisualMetadata>,
    #[serde(skip)]
    default_size: Size,
}

impl Default for MetadataTable {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            default_size: Size::new(160.0, 80.0),
        }
    }
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size given to layout records created by a partial update.
    pub fn with_default_size(mut self, size: Size) -> Self {
        self.default_size = size;
        self
    }

    pub fn default_size(&self) -> Size {
        self.default_size
    }

    pub fn get(&self, key: &str) -> Option<&VisualMetadata> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace the record of `key`, returning the previous one.
    ///
    /// Numbers are sanitized the same way [`MetadataTable::update`] does.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        metadata: VisualMetadata,
    ) -> Option<VisualMetadata> {
        self.entries.insert(key.into(), metadata.sanitized())
    }

    /// Merge a patch into the record of `key`, creating it if absent.
    ///
    /// A partial layout keeps previously known fields; the default size is
    /// only used when no layout record existed.
    pub fn update(&mut self, key: impl Into<String>, patch: MetadataPatch) -> &VisualMetadata {
        let default_size = self.default_size;
        let record = self.entries.entry(key.into()).or_default();
        record.apply(patch, default_size);
        record
    }

    pub fn remove(&mut self, key: &str) -> Option<VisualMetadata> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VisualMetadata)> {
        self.entries
            .iter()
            .map(|(key, metadata)| (key.as_str(), metadata))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay every record of `other`, replacing records with the same key.
    pub fn merge(&mut self, other: &MetadataTable) {
        for (key, metadata) in &other.entries {
            self.insert(key.clone(), metadata.clone());
        }
    }

    /// Report stored values that a renderer could not use.
    ///
    /// Invalid values are kept as written so that serialization stays
    /// lossless; this is where they surface.
    pub fn lint(&self) -> Vec<MetadataIssue> {
        self.entries
            .iter()
            .filter_map(|(key, metadata)| {
                let message = metadata.style.as_ref()?.validate().err()?;
                Some(MetadataIssue {
                    key: key.clone(),
                    message,
                })
            })
            .collect()
    }
}

fn visual_attribute<'a>(element: &'a Element, prefixes: &[String], local: &str) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| element.attribute(&format!("{prefix}:{local}")))
}

fn decode_element(element: &Element, prefixes: &[String], key: &str) -> VisualMetadata {
    let mut metadata = VisualMetadata::default();

    if let Some(value) = visual_attribute(element, prefixes, ATTR_XYWH) {
        match LayoutRect::decode(value) {
            Ok(rect) => metadata.layout = Some(rect),
            Err(err) => warn!(key, value, error:% = err; "Skipping malformed layout"),
        }
    }

    let stroke = visual_attribute(element, prefixes, ATTR_STROKE).map(str::to_string);
    let stroke_width = visual_attribute(element, prefixes, ATTR_STROKE_WIDTH).and_then(|value| {
        match value.trim().parse::<f32>() {
            Ok(width) => Some(visual::sanitize(width)),
            Err(err) => {
                warn!(key, value, error:% = err; "Skipping malformed stroke width");
                None
            }
        }
    });
    if stroke.is_some() || stroke_width.is_some() {
        metadata.style = Some(StrokeStyle {
            stroke,
            stroke_width,
        });
    }

    let curve_type = visual_attribute(element, prefixes, ATTR_CURVE).and_then(|value| {
        CurveType::from_str(value.trim())
            .inspect_err(|err| warn!(key, value, error:% = err; "Skipping malformed curve"))
            .ok()
    });
    let waypoints = match visual_attribute(element, prefixes, ATTR_WAYPOINTS) {
        Some(value) => visual::decode_waypoints(value).unwrap_or_else(|err| {
            warn!(key, value, error:% = err; "Skipping malformed waypoints");
            Vec::new()
        }),
        None => Vec::new(),
    };
    if curve_type.is_some() || !waypoints.is_empty() {
        metadata.diagram = Some(DiagramData {
            curve_type,
            waypoints,
        });
    }

    metadata
}

/// Collect the visual metadata of every keyed element.
///
/// Attributes are recognised under any prefix the document binds to the
/// visual namespace. Malformed values are logged and skipped. When a key
/// occurs twice, the first element wins.
pub fn extract_all(document: &Document) -> MetadataTable {
    let mut table = MetadataTable::new();

    let prefixes = visual_prefixes(document);
    if prefixes.is_empty() {
        trace!("Document does not bind the visual namespace");
        return table;
    }

    for (element, key) in document.walk().zip(element_keys(document)) {
        let Some(key) = key else {
            continue;
        };
        if table.contains_key(&key) {
            continue;
        }
        let metadata = decode_element(element, &prefixes, &key);
        if !metadata.is_empty() {
            table.entries.insert(key, metadata);
        }
    }

    debug!(entries = table.len(), prefixes:? = prefixes; "Extracted visual metadata");
    table
}

/// Like [`extract_all`], but skips the tree walk when `text`, the source
/// `document` was parsed from, never mentions the visual namespace.
pub fn extract_all_from(text: &str, document: &Document) -> MetadataTable {
    if !uses_visual_namespace(text) {
        trace!(len = text.len(); "Source does not mention the visual namespace");
        return MetadataTable::new();
    }
    extract_all(document)
}

/// Options for [`serialize_with_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Write the table as attributes; otherwise strip every visual attribute.
    pub include_metadata: bool,
    /// Re-parse the output and fail on error diagnostics.
    pub validate: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            validate: false,
        }
    }
}

impl SerializeOptions {
    /// Options producing a document without any visual attributes.
    pub fn clean() -> Self {
        Self {
            include_metadata: false,
            validate: false,
        }
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Drop attributes under `prefixes` and declarations of the visual namespace.
fn strip_visual_attributes(element: &mut Element, prefixes: &[String]) {
    element.retain_attributes(|name, value| {
        if name.starts_with(XMLNS_PREFIX) {
            return value != VISUAL_NAMESPACE;
        }
        match name.split_once(':') {
            Some((prefix, _)) => !prefixes.iter().any(|known| known == prefix),
            None => true,
        }
    });
}

/// Write the attributes of one record under `prefix`; returns whether any was written.
fn write_attributes(element: &mut Element, prefix: &str, metadata: &VisualMetadata) -> bool {
    let mut written = false;
    let mut set = |local: &str, value: String| {
        element.set_attribute(format!("{prefix}:{local}"), value);
        written = true;
    };

    if let Some(layout) = metadata.layout {
        set(ATTR_XYWH, layout.encode());
    }
    if let Some(style) = &metadata.style {
        if let Some(stroke) = &style.stroke {
            set(ATTR_STROKE, stroke.clone());
        }
        if let Some(width) = style.stroke_width {
            set(ATTR_STROKE_WIDTH, width.to_string());
        }
    }
    if let Some(diagram) = &metadata.diagram {
        if let Some(curve) = diagram.curve_type {
            set(ATTR_CURVE, curve.to_string());
        }
        if !diagram.waypoints.is_empty() {
            set(ATTR_WAYPOINTS, visual::encode_waypoints(&diagram.waypoints));
        }
    }
    written
}

/// Replace the visual attributes of `document` in place.
///
/// Every attribute under a prefix bound to the visual namespace is removed,
/// together with the binding itself. With `include` set, each keyed element
/// found in `table` then receives attributes under [`output_prefix`] and the
/// root declares that prefix. Returns the number of elements written.
pub fn inject(document: &mut Document, table: &MetadataTable, include: bool) -> usize {
    let prefixes = visual_prefixes(document);
    let prefix = output_prefix(document);
    let mut keys = element_keys(document).into_iter();
    let mut written = 0;

    document.root_mut().visit_mut(&mut |element| {
        let key = keys.next().flatten();
        strip_visual_attributes(element, &prefixes);
        if !include {
            return;
        }
        let Some(metadata) = key.as_deref().and_then(|key| table.get(key)) else {
            return;
        };
        if write_attributes(element, &prefix, metadata) {
            written += 1;
        }
    });

    if written > 0 {
        document
            .root_mut()
            .set_attribute(format!("{XMLNS_PREFIX}{prefix}"), VISUAL_NAMESPACE);
    }
    trace!(written, include, prefix = prefix.as_str(); "Injected visual attributes");
    written
}

/// Serialize `document` with the visual attributes rewritten from `table`.
///
/// The document itself is not modified. Attribute order is stable: plain
/// attributes keep their place and visual attributes follow them in a fixed
/// order, so serializing the same input twice gives identical text.
///
/// # Errors
///
/// With [`SerializeOptions::validate`] set, returns
/// [`MetadataError::InvalidOutput`] when the output does not parse cleanly.
pub fn serialize_with_metadata(
    document: &Document,
    table: &MetadataTable,
    options: SerializeOptions,
) -> Result<String, MetadataError> {
    let mut output = document.clone();
    inject(&mut output, table, options.include_metadata);
    let text = output.to_xml();

    if options.validate {
        statecraft_parser::parse(&text, &ParseOptions::default())
            .into_result()
            .map_err(MetadataError::InvalidOutput)?;
    }

    debug!(len = text.len(), include_metadata = options.include_metadata; "Serialized document");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use float_cmp::approx_eq;
    use proptest::prelude::*;
    use statecraft_core::visual::{DiagramPatch, LayoutPatch, StylePatch, Waypoint};
    use statecraft_parser::parse;

    fn document(source: &str) -> Document {
        parse(source, &ParseOptions::default())
            .into_result()
            .expect("Failed to parse")
    }

    const ANNOTATED: &str = r##"<scxml xmlns:v="https://statecraft.dev/ns/visual" initial="idle">
  <state id="idle" v:xywh="10,20,160,80" v:stroke="#336699">
    <transition event="go" target="busy" v:curve="step" v:waypoints="1,2 3,4"/>
    <transition event="again" target="busy"/>
  </state>
  <state id="busy" v:xywh="nonsense"/>
</scxml>"##;

    #[test]
    fn test_element_keys_follow_walk_order() {
        let doc = document(ANNOTATED);
        let keys = element_keys(&doc);
        assert_eq!(keys.len(), doc.walk().count());
        assert_eq!(
            keys.into_iter().flatten().collect::<Vec<_>>(),
            vec!["idle", "idle->busy#0", "idle->busy#1", "busy"]
        );
    }

    #[test]
    fn test_extract_resolves_declared_prefix() {
        let table = extract_all(&document(ANNOTATED));
        assert_eq!(table.len(), 2);

        let idle = table.get("idle").expect("idle metadata");
        assert_eq!(idle.layout, Some(LayoutRect::new(10.0, 20.0, 160.0, 80.0)));
        assert_eq!(
            idle.style.as_ref().and_then(|s| s.stroke.as_deref()),
            Some("#336699")
        );

        let go = table.get("idle->busy#0").expect("transition metadata");
        let diagram = go.diagram.as_ref().expect("diagram data");
        assert_eq!(diagram.curve_type, Some(CurveType::Step));
        assert_eq!(
            diagram.waypoints,
            vec![Waypoint::new(1.0, 2.0), Waypoint::new(3.0, 4.0)]
        );

        // The malformed geometry is skipped, not fatal.
        assert!(table.get("busy").is_none());
    }

    #[test]
    fn test_undeclared_prefix_is_ignored() {
        let doc = document(r#"<scxml><state id="a" viz:xywh="1,2,3,4"/></scxml>"#);
        assert!(extract_all(&doc).is_empty());
        assert!(!uses_visual_namespace(&doc.to_xml()));
    }

    #[test]
    fn test_partial_update_keeps_size() {
        let mut table = MetadataTable::new();
        let created = table.update("a", MetadataPatch::default().with_layout(LayoutPatch::position(5.0, 6.0)));
        assert_eq!(created.layout, Some(LayoutRect::new(5.0, 6.0, 160.0, 80.0)));

        table.update(
            "a",
            MetadataPatch::default().with_layout(LayoutPatch {
                width: Some(300.0),
                height: Some(90.0),
                ..LayoutPatch::default()
            }),
        );
        let moved = table.update("a", MetadataPatch::default().with_layout(LayoutPatch::position(7.0, 8.0)));
        assert_eq!(moved.layout, Some(LayoutRect::new(7.0, 8.0, 300.0, 90.0)));
    }

    #[test]
    fn test_update_sanitizes_values() {
        let mut table = MetadataTable::new().with_default_size(Size::new(100.0, 50.0));
        let record = table.update(
            "a",
            MetadataPatch::default().with_layout(LayoutPatch {
                x: Some(f32::NAN),
                y: Some(-4.0),
                ..LayoutPatch::default()
            }),
        );
        let layout = record.layout.expect("layout");
        assert!(approx_eq!(f32, layout.x, 0.0));
        assert!(approx_eq!(f32, layout.y, 0.0));
        assert!(approx_eq!(f32, layout.width, 100.0));
    }

    #[test]
    fn test_serialize_rewrites_to_canonical_prefix() {
        let doc = document(ANNOTATED);
        let table = extract_all(&doc);
        let text = serialize_with_metadata(&doc, &table, SerializeOptions::default())
            .expect("serialize");

        assert!(!text.contains("xmlns:v="));
        assert!(!text.contains(" v:"));
        assert!(text.contains(r#"<scxml initial="idle" xmlns:viz="https://statecraft.dev/ns/visual">"#));
        assert!(text.contains(r##"<state id="idle" viz:xywh="10,20,160,80" viz:stroke="#336699">"##));
        assert!(text.contains(r#"<transition event="go" target="busy" viz:curve="step" viz:waypoints="1,2 3,4"/>"#));
        assert!(text.contains(r#"<state id="busy"/>"#));

        // A second cycle is a fixed point.
        let again = serialize_with_metadata(&document(&text), &table, SerializeOptions::default())
            .expect("serialize");
        assert_eq!(again, text);
    }

    #[test]
    fn test_clean_export_strips_everything_visual() {
        let doc = document(ANNOTATED);
        let text = serialize_with_metadata(&doc, &extract_all(&doc), SerializeOptions::clean())
            .expect("serialize");
        assert!(!uses_visual_namespace(&text));
        assert!(!text.contains("v:"));
        assert!(text.starts_with(r#"<scxml initial="idle">"#));
    }

    #[test]
    fn test_unrelated_namespaces_pass_through() {
        let source = r#"<scxml xmlns:ext="urn:ext" ext:owner="ops"><state id="a" ext:note="keep"/></scxml>"#;
        let doc = document(source);
        let mut table = MetadataTable::new();
        table.update("a", MetadataPatch::default().with_layout(LayoutPatch::position(1.0, 2.0)));

        let text = serialize_with_metadata(&doc, &table, SerializeOptions::default().with_validate(true))
            .expect("serialize");
        assert!(text.contains(r#"ext:owner="ops""#));
        assert!(text.contains(r#"<state id="a" ext:note="keep" viz:xywh="1,2,160,80"/>"#));

        let clean = serialize_with_metadata(&doc, &table, SerializeOptions::clean()).expect("serialize");
        assert_eq!(clean, source);
    }

    #[test]
    fn test_foreign_binding_of_canonical_prefix_is_kept() {
        let source = r#"<scxml xmlns:viz="urn:vendor" viz:owner="ops"><state id="a"/></scxml>"#;
        let doc = document(source);
        assert_eq!(output_prefix(&doc), "viz1");
        assert!(extract_all(&doc).is_empty());

        let mut table = MetadataTable::new();
        table.update("a", MetadataPatch::default().with_layout(LayoutPatch::position(10.0, 20.0)));
        let text = serialize_with_metadata(&doc, &table, SerializeOptions::default().with_validate(true))
            .expect("serialize");
        assert_eq!(
            text,
            r#"<scxml xmlns:viz="urn:vendor" viz:owner="ops" xmlns:viz1="https://statecraft.dev/ns/visual"><state id="a" viz1:xywh="10,20,160,80"/></scxml>"#
        );

        // The second cycle reuses the fresh prefix and reads the record back.
        let reparsed = document(&text);
        assert_eq!(extract_all(&reparsed), table);
        let again = serialize_with_metadata(&reparsed, &table, SerializeOptions::default())
            .expect("serialize");
        assert_eq!(again, text);
    }

    #[test]
    fn test_fresh_prefix_skips_taken_names() {
        let doc = document(
            r#"<scxml xmlns:viz="urn:a"><state id="a" xmlns:viz1="urn:b"/></scxml>"#,
        );
        assert_eq!(output_prefix(&doc), "viz2");
    }

    #[test]
    fn test_extract_from_text_without_namespace_skips_walk() {
        let doc = document(ANNOTATED);
        assert!(extract_all_from("<scxml/>", &doc).is_empty());
        assert_eq!(extract_all_from(ANNOTATED, &doc), extract_all(&doc));
    }

    #[test]
    fn test_insert_and_merge_sanitize() {
        let record = VisualMetadata {
            diagram: Some(DiagramData {
                curve_type: None,
                waypoints: vec![Waypoint::new(-5.0, f32::NAN)],
            }),
            ..VisualMetadata::default()
        };
        let mut overlay = MetadataTable::new();
        overlay.entries.insert("a->b#0".to_string(), record.clone());

        let mut table = MetadataTable::new();
        table.merge(&overlay);
        table.insert("c->d#0", record);

        for key in ["a->b#0", "c->d#0"] {
            let waypoints = table
                .get(key)
                .and_then(|metadata| metadata.diagram.as_ref())
                .map(|diagram| diagram.waypoints.clone());
            assert_eq!(waypoints, Some(vec![Waypoint::new(0.0, 0.0)]), "key {key}");
        }
    }

    #[test]
    fn test_waypoint_update_round_trips() {
        let doc = document(
            r#"<scxml><state id="a"><transition target="b"/></state><state id="b"/></scxml>"#,
        );
        let mut table = MetadataTable::new();
        table.update(
            "a->b#0",
            MetadataPatch::default().with_diagram(DiagramPatch {
                curve_type: None,
                waypoints: Some(vec![Waypoint::new(-5.0, f32::NAN), Waypoint::new(7.5, 2.0)]),
            }),
        );

        let text = serialize_with_metadata(&doc, &table, SerializeOptions::default())
            .expect("serialize");
        assert_eq!(extract_all(&document(&text)), table);
    }

    #[test]
    fn test_empty_table_adds_no_declaration() {
        let source = r#"<scxml><state id="a"/></scxml>"#;
        let text = serialize_with_metadata(&document(source), &MetadataTable::new(), SerializeOptions::default())
            .expect("serialize");
        assert_eq!(text, source);
    }

    #[test]
    fn test_lint_reports_invalid_colors() {
        let mut table = MetadataTable::new();
        table.update(
            "good",
            MetadataPatch::default().with_style(StylePatch {
                stroke: Some("steelblue".to_string()),
                stroke_width: None,
            }),
        );
        table.update(
            "bad",
            MetadataPatch::default().with_style(StylePatch {
                stroke: Some("not-a-color".to_string()),
                stroke_width: Some(2.0),
            }),
        );

        let issues = table.lint();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "bad");
    }

    fn coordinate() -> impl Strategy<Value = f32> {
        (0u32..100_000).prop_map(|value| value as f32 / 8.0)
    }

    fn metadata_strategy() -> impl Strategy<Value = VisualMetadata> {
        (
            prop::option::of((coordinate(), coordinate(), coordinate(), coordinate())),
            prop::option::of(prop::sample::select(vec!["#ff0000", "red", "rgb(1, 2, 3)"])),
            prop::option::of(coordinate()),
            prop::option::of(prop::sample::select(vec![
                CurveType::Smooth,
                CurveType::Step,
                CurveType::Straight,
                CurveType::Bezier,
            ])),
            prop::collection::vec((coordinate(), coordinate()), 0..4),
        )
            .prop_map(|(rect, stroke, stroke_width, curve_type, waypoints)| {
                let style = (stroke.is_some() || stroke_width.is_some()).then(|| StrokeStyle {
                    stroke: stroke.map(str::to_string),
                    stroke_width,
                });
                let waypoints: Vec<_> = waypoints
                    .into_iter()
                    .map(|(x, y)| Waypoint::new(x, y))
                    .collect();
                let diagram = (curve_type.is_some() || !waypoints.is_empty()).then(|| DiagramData {
                    curve_type,
                    waypoints,
                });
                VisualMetadata {
                    layout: rect.map(|(x, y, w, h)| LayoutRect::new(x, y, w, h)),
                    style,
                    diagram,
                }
            })
    }

    fn check_metadata_round_trip(records: Vec<VisualMetadata>) -> Result<(), TestCaseError> {
        let doc = document(
            r#"<scxml initial="s0">
  <state id="s0"><transition event="e" target="s1"/></state>
  <state id="s1"><transition target="s0"/><transition target="s0"/></state>
  <final id="s2"/>
</scxml>"#,
        );
        let keys = ["s0", "s0->s1#0", "s1", "s1->s0#0", "s1->s0#1", "s2"];

        let mut table = MetadataTable::new();
        for (key, metadata) in keys.iter().zip(records) {
            if !metadata.is_empty() {
                table.insert(*key, metadata);
            }
        }

        let text = serialize_with_metadata(&doc, &table, SerializeOptions::default())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let extracted = extract_all(&document(&text));

        prop_assert_eq!(extracted.len(), table.len());
        for (key, metadata) in table.iter() {
            prop_assert_eq!(extracted.get(key), Some(metadata), "key {}", key);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn metadata_survives_serialization(records in prop::collection::vec(metadata_strategy(), 6)) {
            check_metadata_round_trip(records)?;
        }
    }
}
