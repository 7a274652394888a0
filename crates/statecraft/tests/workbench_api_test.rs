//! Integration tests for the Workbench API
//!
//! These tests drive the public pipeline end to end: parsing, validation,
//! layout and export.

use statecraft::{
    ErrorCode, Severity, StatecraftError, Workbench,
    config::AppConfig,
    metadata::{MetadataTable, SerializeOptions},
    semantic::LayoutPolicy,
    visual::LayoutRect,
};

const TRAFFIC_LIGHT: &str = r#"<scxml xmlns="http://www.w3.org/2005/07/scxml" version="1.0" initial="s0">
  <state id="s0">
    <transition event="next" target="s1"/>
  </state>
  <state id="s1">
    <transition event="next" target="s0"/>
  </state>
</scxml>"#;

#[test]
fn test_parse_simple_machine() {
    let workbench = Workbench::default();
    let result = workbench.parse(TRAFFIC_LIGHT);
    assert!(result.is_ok(), "Should parse valid machine: {:?}", result.err());
}

#[test]
fn test_parse_error_keeps_source_and_diagnostics() {
    let source = "<scxml>\n  <state id=\"a\">\n</scxml>";
    let workbench = Workbench::default();

    match workbench.parse(source) {
        Err(StatecraftError::Parse { err, src }) => {
            assert_eq!(src, source);
            assert!(err.errors().count() > 0);
        }
        other => panic!("Expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_validate_reports_warnings_without_failing() {
    let source = r#"<scxml><state id="a"><transition target="ghost"/></state></scxml>"#;
    let outcome = Workbench::default().validate(source);

    assert!(outcome.success());
    let warnings: Vec<_> = outcome
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity() == Severity::Warning)
        .map(|diagnostic| diagnostic.code())
        .collect();
    assert_eq!(warnings, vec![Some(ErrorCode::E203)]);
}

#[test]
fn test_layout_places_top_level_states() {
    let workbench = Workbench::default();
    let document = workbench.parse(TRAFFIC_LIGHT).expect("Failed to parse");
    let metadata = workbench.metadata(TRAFFIC_LIGHT, &document);
    assert!(metadata.is_empty());

    let layout = workbench
        .layout(&document, &metadata)
        .expect("Failed to lay out");
    assert_eq!(
        layout.child_layouts.get("s0"),
        Some(&LayoutRect::new(20.0, 60.0, 120.0, 80.0))
    );
    assert_eq!(
        layout.child_layouts.get("s1"),
        Some(&LayoutRect::new(160.0, 60.0, 120.0, 80.0))
    );
}

#[test]
fn test_layout_with_tiered_policy() {
    let workbench = Workbench::new(AppConfig::default().with_policy(LayoutPolicy::Tiered));
    let document = workbench.parse(TRAFFIC_LIGHT).expect("Failed to parse");
    let layout = workbench
        .layout(&document, &MetadataTable::new())
        .expect("Failed to lay out");
    assert_eq!(layout.child_layouts.len(), 2);
}

#[test]
fn test_auto_layout_is_idempotent() {
    let workbench = Workbench::default();
    let placed = workbench.auto_layout(TRAFFIC_LIGHT).expect("Failed to lay out");

    assert!(placed.contains(r#"xmlns:viz="https://statecraft.dev/ns/visual""#));
    assert!(placed.contains(r#"<state id="s0" viz:xywh="20,60,120,80">"#));
    assert!(placed.contains(r#"<state id="s1" viz:xywh="160,60,120,80">"#));

    let again = workbench.auto_layout(&placed).expect("Failed to lay out");
    assert_eq!(again, placed);
}

#[test]
fn test_auto_layout_keeps_explicit_positions() {
    let source = r#"<scxml xmlns:viz="https://statecraft.dev/ns/visual"><state id="a" viz:xywh="500,400,300,200"/><state id="b"/></scxml>"#;
    let placed = Workbench::default().auto_layout(source).expect("Failed to lay out");

    assert!(placed.contains(r#"<state id="a" viz:xywh="500,400,300,200"/>"#));
    assert!(placed.contains(r#"<state id="b" viz:xywh="#));
}

#[test]
fn test_export_clean_strips_visual_markup() {
    let source = "<scxml xmlns:viz=\"https://statecraft.dev/ns/visual\" initial=\"a\">\n  <state id=\"a\" viz:xywh=\"0,0,160,80\" viz:stroke=\"red\">\n    <transition target=\"a\" viz:curve=\"step\"/>\n  </state>\n</scxml>";
    let clean = Workbench::default()
        .export(source, SerializeOptions::clean())
        .expect("Failed to export");

    assert_eq!(
        clean,
        "<scxml initial=\"a\">\n  <state id=\"a\">\n    <transition target=\"a\"/>\n  </state>\n</scxml>"
    );
}

#[test]
fn test_export_canonicalizes_prefix() {
    let source = r#"<scxml xmlns:v="https://statecraft.dev/ns/visual"><state id="a" v:xywh="1,2,3,4"/></scxml>"#;
    let exported = Workbench::default()
        .export(source, SerializeOptions::default().with_validate(true))
        .expect("Failed to export");

    assert_eq!(
        exported,
        r#"<scxml xmlns:viz="https://statecraft.dev/ns/visual"><state id="a" viz:xywh="1,2,3,4"/></scxml>"#
    );
}
