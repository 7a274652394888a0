//! Visual metadata attached to states and transitions.
//!
//! Visual data lives next to the state-machine markup as namespaced
//! attributes (`viz:xywh`, `viz:stroke`, ...). This module defines the typed
//! records, their attribute encodings and the field-wise patches used to
//! update them. Storage and extraction are handled by the metadata manager.

use std::{fmt, num::ParseFloatError, str::FromStr};

use color::DynamicColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Bounds, Point, Size};

/// Namespace URI identifying visual attributes.
pub const VISUAL_NAMESPACE: &str = "https://statecraft.dev/ns/visual";
/// Canonical prefix bound to [`VISUAL_NAMESPACE`] when writing.
pub const VISUAL_PREFIX: &str = "viz";

/// Local name of the position and size attribute (`"x,y,width,height"`).
pub const ATTR_XYWH: &str = "xywh";
/// Local name of the stroke color attribute.
pub const ATTR_STROKE: &str = "stroke";
/// Local name of the stroke width attribute.
pub const ATTR_STROKE_WIDTH: &str = "stroke-width";
/// Local name of the transition curve attribute.
pub const ATTR_CURVE: &str = "curve";
/// Local name of the transition waypoints attribute (`"x,y x,y"`).
pub const ATTR_WAYPOINTS: &str = "waypoints";

/// Errors raised when decoding an attribute value.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("expected {expected} numbers, found {found}")]
    WrongArity { expected: usize, found: usize },

    #[error("invalid number `{value}`: {source}")]
    InvalidNumber {
        value: String,
        source: ParseFloatError,
    },

    #[error("invalid waypoint `{0}`, expected `x,y`")]
    InvalidWaypoint(String),

    #[error("invalid curve type `{0}`, valid values: smooth, step, straight, bezier")]
    InvalidCurve(String),
}

/// Replace values that cannot be laid out (NaN, infinities, negatives).
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value >= 0.0 { value } else { 0.0 }
}

fn parse_number(value: &str) -> Result<f32, DecodeError> {
    value
        .parse::<f32>()
        .map_err(|source| DecodeError::InvalidNumber {
            value: value.to_string(),
            source,
        })
}

/// Position and size of a state, in the coordinate space of its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rect from a top-left position and size.
    pub fn from_parts(position: Point, size: Size) -> Self {
        Self::new(position.x(), position.y(), size.width(), size.height())
    }

    /// Returns the rect with every field made finite and non-negative.
    pub fn sanitized(self) -> Self {
        Self::new(
            sanitize(self.x),
            sanitize(self.y),
            sanitize(self.width),
            sanitize(self.height),
        )
    }

    pub fn position(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn to_bounds(self) -> Bounds {
        Bounds::new_from_top_left(self.position(), self.size())
    }

    /// Encode as the comma separated `xywh` attribute value.
    pub fn encode(self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.width, self.height)
    }

    /// Decode an `xywh` attribute value. Out-of-range numbers are sanitized.
    pub fn decode(value: &str) -> Result<Self, DecodeError> {
        let parts: Vec<&str> = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() != 4 {
            return Err(DecodeError::WrongArity {
                expected: 4,
                found: parts.len(),
            });
        }
        let numbers = parts
            .into_iter()
            .map(parse_number)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]).sanitized())
    }
}

/// Stroke styling for a state or transition.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
}

impl StrokeStyle {
    /// Check that the stroke color is a valid CSS color, if present.
    pub fn validate(&self) -> Result<(), String> {
        match &self.stroke {
            Some(stroke) => validate_color(stroke),
            None => Ok(()),
        }
    }

    fn is_empty(&self) -> bool {
        self.stroke.is_none() && self.stroke_width.is_none()
    }
}

/// Check that a string is a CSS color such as `#ff0000`, `rgb(...)` or `red`.
pub fn validate_color(value: &str) -> Result<(), String> {
    DynamicColor::from_str(value)
        .map(|_| ())
        .map_err(|err| format!("invalid color `{value}`: {err}"))
}

/// Curve style used when drawing a transition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    #[default]
    Smooth,
    Step,
    Straight,
    Bezier,
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Smooth => "smooth",
            Self::Step => "step",
            Self::Straight => "straight",
            Self::Bezier => "bezier",
        };
        f.write_str(name)
    }
}

impl FromStr for CurveType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "smooth" => Ok(Self::Smooth),
            "step" => Ok(Self::Step),
            "straight" => Ok(Self::Straight),
            "bezier" => Ok(Self::Bezier),
            other => Err(DecodeError::InvalidCurve(other.to_string())),
        }
    }
}

/// Intermediate point a transition is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
}

impl Waypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the point with both coordinates made finite and non-negative.
    pub fn sanitized(self) -> Self {
        Self::new(sanitize(self.x), sanitize(self.y))
    }
}

/// Encode waypoints as `"x,y x,y ..."`.
pub fn encode_waypoints(waypoints: &[Waypoint]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{},{}", point.x, point.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode a `waypoints` attribute value.
pub fn decode_waypoints(value: &str) -> Result<Vec<Waypoint>, DecodeError> {
    value
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| DecodeError::InvalidWaypoint(pair.to_string()))?;
            Ok(Waypoint::new(parse_number(x)?, parse_number(y)?).sanitized())
        })
        .collect()
}

/// Routing data of a transition.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    pub curve_type: Option<CurveType>,
    pub waypoints: Vec<Waypoint>,
}

impl DiagramData {
    fn is_empty(&self) -> bool {
        self.curve_type.is_none() && self.waypoints.is_empty()
    }
}

/// Everything known about how one element should be drawn.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualMetadata {
    pub layout: Option<LayoutRect>,
    pub style: Option<StrokeStyle>,
    pub diagram: Option<DiagramData>,
}

impl VisualMetadata {
    /// Returns `true` when no field carries data.
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
            && self.style.as_ref().is_none_or(StrokeStyle::is_empty)
            && self.diagram.as_ref().is_none_or(DiagramData::is_empty)
    }

    /// Returns the record with every number made finite and non-negative.
    ///
    /// Stroke colors are left as written.
    pub fn sanitized(mut self) -> Self {
        self.layout = self.layout.map(LayoutRect::sanitized);
        if let Some(style) = &mut self.style {
            style.stroke_width = style.stroke_width.map(sanitize);
        }
        if let Some(diagram) = &mut self.diagram {
            for point in &mut diagram.waypoints {
                *point = point.sanitized();
            }
        }
        self
    }

    /// Merge a patch into this record, field by field.
    ///
    /// Fields absent from the patch keep their previous value. When no layout
    /// existed before, missing position fields default to zero and missing
    /// size fields to `default_size`.
    pub fn apply(&mut self, patch: MetadataPatch, default_size: Size) {
        if let Some(layout) = patch.layout {
            let base = self.layout.unwrap_or(LayoutRect::new(
                0.0,
                0.0,
                default_size.width(),
                default_size.height(),
            ));
            self.layout = Some(
                LayoutRect::new(
                    layout.x.unwrap_or(base.x),
                    layout.y.unwrap_or(base.y),
                    layout.width.unwrap_or(base.width),
                    layout.height.unwrap_or(base.height),
                )
                .sanitized(),
            );
        }

        if let Some(style) = patch.style {
            let current = self.style.get_or_insert_with(StrokeStyle::default);
            if style.stroke.is_some() {
                current.stroke = style.stroke;
            }
            if let Some(width) = style.stroke_width {
                current.stroke_width = Some(sanitize(width));
            }
        }

        if let Some(diagram) = patch.diagram {
            let current = self.diagram.get_or_insert_with(DiagramData::default);
            if diagram.curve_type.is_some() {
                current.curve_type = diagram.curve_type;
            }
            if let Some(waypoints) = diagram.waypoints {
                current.waypoints = waypoints.into_iter().map(Waypoint::sanitized).collect();
            }
        }
    }
}

/// Partial layout update; `None` fields are left unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LayoutPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl LayoutPatch {
    /// Patch only the position.
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch position and size.
    pub fn rect(rect: LayoutRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
        }
    }
}

/// Partial style update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StylePatch {
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
}

/// Partial routing update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiagramPatch {
    pub curve_type: Option<CurveType>,
    pub waypoints: Option<Vec<Waypoint>>,
}

/// A field-wise update of a [`VisualMetadata`] record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetadataPatch {
    pub layout: Option<LayoutPatch>,
    pub style: Option<StylePatch>,
    pub diagram: Option<DiagramPatch>,
}

impl MetadataPatch {
    pub fn with_layout(mut self, layout: LayoutPatch) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_style(mut self, style: StylePatch) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_diagram(mut self, diagram: DiagramPatch) -> Self {
        self.diagram = Some(diagram);
        self
    }
}

impl From<&VisualMetadata> for MetadataPatch {
    fn from(metadata: &VisualMetadata) -> Self {
        Self {
            layout: metadata.layout.map(LayoutPatch::rect),
            style: metadata.style.as_ref().map(|style| StylePatch {
                stroke: style.stroke.clone(),
                stroke_width: style.stroke_width,
            }),
            diagram: metadata.diagram.as_ref().map(|diagram| DiagramPatch {
                curve_type: diagram.curve_type,
                waypoints: (!diagram.waypoints.is_empty()).then(|| diagram.waypoints.clone()),
            }),
        }
    }
}
