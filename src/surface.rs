//! Features and styles handed to a [`MapSurface`](crate::traits::MapSurface).
//!
//! Positions in these types are already projected into map space.

use crate::polyline::Polyline;

/// Identifies a clickable feature on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    City(String),
    Route(String),
}

/// A city marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub id: FeatureId,
    pub position: (f64, f64),
    pub label: String,
    pub delivery_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
    /// Dash and gap lengths in pixels; `None` draws a solid line.
    pub dash: Option<[f64; 2]>,
}

impl LineStyle {
    /// Highlighted route: solid, heavier, darker.
    pub fn selected() -> Self {
        Self {
            color: "#1d4ed8",
            width: 5.0,
            dash: None,
        }
    }

    /// Route shown in list context: dashed, lighter.
    pub fn unselected() -> Self {
        Self {
            color: "#93c5fd",
            width: 3.0,
            dash: Some([8.0, 6.0]),
        }
    }

    pub fn is_solid(&self) -> bool {
        self.dash.is_none()
    }
}

/// A route geometry projected into map space.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub id: FeatureId,
    pub points: Vec<(f64, f64)>,
    pub style: LineStyle,
}

impl LineFeature {
    pub fn from_polyline(
        vehicle_id: &str,
        polyline: &Polyline,
        style: LineStyle,
        project: impl Fn((f64, f64)) -> (f64, f64),
    ) -> Self {
        Self {
            id: FeatureId::Route(vehicle_id.to_string()),
            points: polyline.points().iter().map(|&coord| project(coord)).collect(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: (f64, f64),
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_differ() {
        let selected = LineStyle::selected();
        let unselected = LineStyle::unselected();
        assert!(selected.is_solid());
        assert!(!unselected.is_solid());
        assert!(selected.width > unselected.width);
        assert_ne!(selected.color, unselected.color);
    }

    #[test]
    fn test_line_feature_projects_every_point() {
        let polyline = Polyline::new(vec![(1.0, 2.0), (3.0, 4.0)]);
        let line = LineFeature::from_polyline("V1", &polyline, LineStyle::selected(), |(x, y)| (x * 10.0, y * 10.0));
        assert_eq!(line.id, FeatureId::Route("V1".to_string()));
        assert_eq!(line.points, vec![(10.0, 20.0), (30.0, 40.0)]);
    }
}
