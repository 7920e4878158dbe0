//! Overlay - Visual Objects Placed on the Map Surface

use std::sync::Arc;

use crate::constants::{
    HANGAR_FILL_COLOR, HANGAR_FILL_OPACITY, HANGAR_STROKE_COLOR,
    HANGAR_STROKE_OPACITY, HANGAR_STROKE_WEIGHT,
};
use crate::domain::geo::LatLng;

/// Outline of a circle overlay
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Arc<str>,
    pub opacity: f32,
    pub weight: u32,
}

/// Interior of a circle overlay
#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub color: Arc<str>,
    pub opacity: f32,
}

impl StrokeStyle {
    /// Outline used for hangar geofences
    pub fn hangar() -> Self {
        Self {
            color: HANGAR_STROKE_COLOR.into(),
            opacity: HANGAR_STROKE_OPACITY,
            weight: HANGAR_STROKE_WEIGHT,
        }
    }
}

impl FillStyle {
    /// Fill used for hangar geofences
    pub fn hangar() -> Self {
        Self {
            color: HANGAR_FILL_COLOR.into(),
            opacity: HANGAR_FILL_OPACITY,
        }
    }
}

/// A marker at a single position
#[derive(Debug, Clone, PartialEq)]
pub struct PointOverlay {
    pub position: LatLng,
    pub icon: Option<Arc<str>>,
    pub title: Option<Arc<str>>,
}

/// A filled circle around a center
#[derive(Debug, Clone, PartialEq)]
pub struct CircleOverlay {
    pub center: LatLng,
    pub radius_meters: f64,
    pub stroke: StrokeStyle,
    pub fill: FillStyle,
    pub title: Option<Arc<str>>,
}

/// Anything the registry can place on a map surface
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Point(PointOverlay),
    Circle(CircleOverlay),
}

impl Overlay {
    /// Anchor position of the overlay
    pub fn position(&self) -> LatLng {
        match self {
            Overlay::Point(point) => point.position,
            Overlay::Circle(circle) => circle.center,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Overlay::Point(point) => point.title.as_deref(),
            Overlay::Circle(circle) => circle.title.as_deref(),
        }
    }

    pub fn as_circle(&self) -> Option<&CircleOverlay> {
        match self {
            Overlay::Circle(circle) => Some(circle),
            Overlay::Point(_) => None,
        }
    }

    pub fn as_point(&self) -> Option<&PointOverlay> {
        match self {
            Overlay::Point(point) => Some(point),
            Overlay::Circle(_) => None,
        }
    }
}

impl From<PointOverlay> for Overlay {
    fn from(point: PointOverlay) -> Self {
        Overlay::Point(point)
    }
}

impl From<CircleOverlay> for Overlay {
    fn from(circle: CircleOverlay) -> Self {
        Overlay::Circle(circle)
    }
}

/// Cosmetic radius for a geofence so small real radii stay visible
///
/// Strictly increasing for `radius >= 0`; negative radii clamp to zero.
pub fn display_radius(radius: f64, scale: f64) -> f64 {
    radius.max(0.0).sqrt() * scale
}

/// Content of the info window opened when a droppoint marker is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPopup {
    pub name: Arc<str>,
    pub description: Arc<str>,
}

impl InfoPopup {
    pub fn new(name: impl Into<Arc<str>>, description: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Render the popup body as an HTML fragment
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<div id=\"content\">",
                "<div id=\"siteNotice\"></div>",
                "<h5 id=\"firstHeading\" class=\"firstHeading\">{}</h5>",
                "<div id=\"bodyContent\"><p>{}</p></div>",
                "</div>"
            ),
            escape_html(&self.name),
            escape_html(&self.description),
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
