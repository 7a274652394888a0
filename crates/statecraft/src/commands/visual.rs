//! Commands that only touch the metadata table.

use log::debug;

use statecraft_core::visual::{
    CurveType, DiagramPatch, LayoutPatch, LayoutRect, MetadataPatch, StylePatch, Waypoint,
    sanitize,
};

use super::{CommandError, Edit, EditContext};

/// Move an element, keeping its size.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePosition {
    pub key: String,
    pub x: f32,
    pub y: f32,
}

impl UpdatePosition {
    pub fn new(key: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            key: key.into(),
            x,
            y,
        }
    }
}

impl Edit for UpdatePosition {
    fn is_structural(&self) -> bool {
        false
    }

    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        context.require_key(&self.key)?;
        let patch = LayoutPatch::position(sanitize(self.x), sanitize(self.y));
        let record = context
            .metadata
            .update(self.key.as_str(), MetadataPatch::default().with_layout(patch));
        debug!(key = self.key, layout:? = record.layout; "Updated position");
        Ok(())
    }
}

/// Move and resize an element.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePositionAndDimensions {
    pub key: String,
    pub rect: LayoutRect,
}

impl UpdatePositionAndDimensions {
    pub fn new(key: impl Into<String>, rect: LayoutRect) -> Self {
        Self {
            key: key.into(),
            rect,
        }
    }
}

impl Edit for UpdatePositionAndDimensions {
    fn is_structural(&self) -> bool {
        false
    }

    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        context.require_key(&self.key)?;
        let patch = LayoutPatch::rect(self.rect.sanitized());
        context
            .metadata
            .update(self.key.as_str(), MetadataPatch::default().with_layout(patch));
        debug!(key = self.key, rect:? = self.rect; "Updated bounds");
        Ok(())
    }
}

/// Replace the waypoints of a transition and optionally its curve type.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateWaypoints {
    pub key: String,
    pub waypoints: Vec<Waypoint>,
    pub curve_type: Option<CurveType>,
}

impl UpdateWaypoints {
    pub fn new(key: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            key: key.into(),
            waypoints,
            curve_type: None,
        }
    }

    pub fn with_curve_type(mut self, curve_type: CurveType) -> Self {
        self.curve_type = Some(curve_type);
        self
    }
}

impl Edit for UpdateWaypoints {
    fn is_structural(&self) -> bool {
        false
    }

    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        context.require_key(&self.key)?;
        let waypoints = self
            .waypoints
            .iter()
            .map(|point| Waypoint::new(sanitize(point.x), sanitize(point.y)))
            .collect();
        let patch = DiagramPatch {
            curve_type: self.curve_type,
            waypoints: Some(waypoints),
        };
        context
            .metadata
            .update(self.key.as_str(), MetadataPatch::default().with_diagram(patch));
        debug!(key = self.key, waypoints = self.waypoints.len(); "Updated waypoints");
        Ok(())
    }
}

/// Change the stroke of an element.
///
/// Values are stored verbatim; [`MetadataTable::lint`](crate::metadata::MetadataTable::lint)
/// reports colors and widths that renderers will not understand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStyle {
    pub key: String,
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
}

impl UpdateStyle {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>) -> Self {
        self.stroke = Some(stroke.into());
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = Some(width);
        self
    }
}

impl Edit for UpdateStyle {
    fn is_structural(&self) -> bool {
        false
    }

    fn execute(&self, context: &mut EditContext) -> Result<(), CommandError> {
        context.require_key(&self.key)?;
        let patch = StylePatch {
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
        };
        context
            .metadata
            .update(self.key.as_str(), MetadataPatch::default().with_style(patch));
        debug!(key = self.key; "Updated style");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use statecraft_parser::{ParseOptions, parse};

    use crate::metadata::MetadataTable;

    const SOURCE: &str = r#"<scxml xmlns:viz="https://statecraft.dev/ns/visual">
  <state id="a" viz:xywh="10,10,200,100">
    <transition event="go" target="b"/>
  </state>
  <state id="b"/>
</scxml>"#;

    fn context() -> EditContext {
        let document = parse(SOURCE, &ParseOptions::default())
            .into_result()
            .expect("Failed to parse");
        let metadata = crate::metadata::extract_all(&document);
        EditContext { document, metadata }
    }

    #[test]
    fn test_position_keeps_size() {
        let mut context = context();
        UpdatePosition::new("a", 50.0, f32::NAN)
            .execute(&mut context)
            .expect("update");
        let layout = context.metadata.get("a").and_then(|record| record.layout);
        assert_eq!(layout, Some(LayoutRect::new(50.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn test_position_of_unplaced_element_uses_default_size() {
        let mut context = context();
        UpdatePosition::new("b", 5.0, 6.0)
            .execute(&mut context)
            .expect("update");
        let layout = context.metadata.get("b").and_then(|record| record.layout);
        assert_eq!(layout, Some(LayoutRect::new(5.0, 6.0, 160.0, 80.0)));
    }

    #[test]
    fn test_bounds() {
        let mut context = context();
        UpdatePositionAndDimensions::new("b", LayoutRect::new(1.0, 2.0, -3.0, 4.0))
            .execute(&mut context)
            .expect("update");
        let layout = context.metadata.get("b").and_then(|record| record.layout);
        assert_eq!(layout, Some(LayoutRect::new(1.0, 2.0, 0.0, 4.0)));
    }

    #[test]
    fn test_waypoints_on_transition_key() {
        let mut context = context();
        UpdateWaypoints::new("a->b#0", vec![Waypoint::new(1.0, 2.0), Waypoint::new(3.0, 4.0)])
            .with_curve_type(CurveType::Step)
            .execute(&mut context)
            .expect("update");

        let diagram = context
            .metadata
            .get("a->b#0")
            .and_then(|record| record.diagram.clone())
            .expect("diagram data");
        assert_eq!(diagram.curve_type, Some(CurveType::Step));
        assert_eq!(diagram.waypoints.len(), 2);
    }

    #[test]
    fn test_style_is_stored_verbatim() {
        let mut context = context();
        UpdateStyle::new("a")
            .with_stroke("not-a-color")
            .with_stroke_width(2.0)
            .execute(&mut context)
            .expect("update");
        assert_eq!(context.metadata.lint().len(), 1);
    }

    #[test]
    fn test_unknown_key() {
        let mut context = context();
        let result = UpdatePosition::new("a->c#0", 0.0, 0.0).execute(&mut context);
        assert!(matches!(result, Err(CommandError::ElementNotFound(key)) if key == "a->c#0"));
        assert!(context.metadata.get("a->c#0").is_none());
    }
}
