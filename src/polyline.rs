//! Polyline representation for route geometries.
//!
//! Points are kept as decoded `(lat, lng)` pairs. GeoJSON stores positions as
//! `[lng, lat]`, so conversion happens here at the boundary.

use serde::{Deserialize, Serialize};

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from `(lat, lng)` points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Two-point polyline connecting `from` and `to` directly.
    pub fn straight(from: (f64, f64), to: (f64, f64)) -> Self {
        Self::new(vec![from, to])
    }

    /// Builds a polyline from GeoJSON positions (`[lng, lat, ...]`).
    ///
    /// Positions with fewer than two ordinates are rejected.
    pub fn from_positions(positions: &[Vec<f64>]) -> Option<Self> {
        positions
            .iter()
            .map(|position| match position.as_slice() {
                [lng, lat, ..] => Some((*lat, *lng)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// GeoJSON positions in `[lng, lat]` order.
    pub fn to_positions(&self) -> Vec<Vec<f64>> {
        self.points.iter().map(|(lat, lng)| vec![*lng, *lat]).collect()
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_points() {
        let points = vec![(-33.442, -70.6545), (-33.438, -70.654)];
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.points(), &points[..]);
        assert_eq!(polyline.into_points(), points);
    }

    #[test]
    fn test_positions_swap_axis_order() {
        let polyline = Polyline::straight((-33.442, -70.6545), (-33.438, -70.654));
        assert_eq!(
            polyline.to_positions(),
            vec![vec![-70.6545, -33.442], vec![-70.654, -33.438]]
        );
    }

    #[test]
    fn test_from_positions_ignores_altitude() {
        let polyline = Polyline::from_positions(&[vec![-70.65, -33.44, 550.0], vec![-70.66, -33.45]])
            .expect("valid positions");
        assert_eq!(polyline.points(), &[(-33.44, -70.65), (-33.45, -70.66)]);
    }

    #[test]
    fn test_from_positions_rejects_short_position() {
        assert!(Polyline::from_positions(&[vec![-70.65]]).is_none());
    }

    #[test]
    fn test_empty_polyline() {
        let polyline = Polyline::default();
        assert!(polyline.is_empty());
        assert!(polyline.to_positions().is_empty());
    }
}
