//! Segment router: stitches a multi-stop walking route from a routing oracle.
//!
//! Every consecutive pair of stops becomes one segment. A segment uses the
//! oracle's path only when both stops resolve to graph vertices, the oracle
//! returns edges, and the path is not too circuitous compared to the straight
//! line. Anything else degrades to a straight-line fallback for that segment.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::haversine::{haversine_m, walking_minutes, DEFAULT_WALKING_SPEED_M_PER_MIN};
use crate::itinerary::Stop;
use crate::polyline::Polyline;
use crate::traits::{PathOracle, RouteEdge, UNNAMED_STREET, VertexLocator, VertexRef};

/// Default maximum ratio between computed and direct distance.
pub const DEFAULT_CIRCUITY_RATIO: f64 = 2.5;

#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// A computed path is accepted only if shorter than this multiple of the
    /// straight-line distance.
    pub circuity_ratio: f64,
    /// Walking speed used for the time estimate, in meters per minute.
    pub walking_speed_m_per_min: f64,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            circuity_ratio: DEFAULT_CIRCUITY_RATIO,
            walking_speed_m_per_min: DEFAULT_WALKING_SPEED_M_PER_MIN,
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("an itinerary needs at least two stops, got {0}")]
    TooFewStops(usize),
}

/// Why a segment was drawn as a straight line.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// One of the endpoints has no vertex in the main component.
    VertexNotFound,
    /// The oracle found no path between the two vertices.
    NoPath,
    /// The oracle call failed.
    OracleError(String),
    /// The computed path exceeded the circuity bound.
    Implausible { computed_m: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentPath {
    Computed {
        edges: Vec<RouteEdge>,
        /// Distinct named streets in traversal order.
        streets: Vec<String>,
    },
    Fallback {
        geometry: Polyline,
        reason: FallbackReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentResult {
    /// Zero-based segment position; segment `i` joins stops `i` and `i + 1`.
    pub index: usize,
    pub direct_m: f64,
    /// Distance contributed to the route total.
    pub distance_m: f64,
    pub path: SegmentPath,
}

impl SegmentResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self.path, SegmentPath::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub stops: Vec<Stop>,
    pub segments: Vec<SegmentResult>,
    pub total_distance_m: f64,
    pub walking_minutes: u32,
    pub handling_minutes: u32,
    /// Walking plus handling time.
    pub total_minutes: u32,
}

impl RoutePlan {
    pub fn fallback_count(&self) -> usize {
        self.segments.iter().filter(|segment| segment.is_fallback()).count()
    }
}

/// Routes an ordered itinerary segment by segment.
///
/// Oracle failures never abort the itinerary; they only turn the affected
/// segment into a fallback.
pub fn route_itinerary<L, O>(
    stops: &[Stop],
    locator: &L,
    oracle: &O,
    options: &RouteOptions,
) -> Result<RoutePlan, RouteError>
where
    L: VertexLocator,
    O: PathOracle,
{
    if stops.len() < 2 {
        return Err(RouteError::TooFewStops(stops.len()));
    }

    let vertices: Vec<Option<VertexRef>> = stops.iter().map(|stop| resolve_vertex(locator, stop)).collect();

    let mut segments = Vec::with_capacity(stops.len() - 1);
    let mut total_distance_m = 0.0;

    for (index, pair) in stops.windows(2).enumerate() {
        let (origin, destination) = (&pair[0], &pair[1]);
        info!(segment = index + 1, from = %origin.name, to = %destination.name, "Routing segment");

        let segment = route_segment(
            index,
            origin,
            destination,
            vertices[index],
            vertices[index + 1],
            oracle,
            options,
        );
        total_distance_m += segment.distance_m;
        segments.push(segment);
    }

    let walking = walking_minutes(total_distance_m, options.walking_speed_m_per_min);
    let handling: u32 = stops.iter().map(|stop| stop.handling_minutes).sum();

    info!(
        total_m = total_distance_m.round(),
        walking_minutes = walking,
        handling_minutes = handling,
        "Route summary"
    );

    Ok(RoutePlan {
        stops: stops.to_vec(),
        segments,
        total_distance_m,
        walking_minutes: walking,
        handling_minutes: handling,
        total_minutes: walking + handling,
    })
}

fn resolve_vertex<L: VertexLocator>(locator: &L, stop: &Stop) -> Option<VertexRef> {
    match locator.nearest_vertex(stop.location()) {
        Ok(Some(vertex)) => {
            debug!(stop = %stop.name, vertex = vertex.id, distance_m = vertex.distance_m.round(), "Resolved vertex");
            Some(vertex)
        }
        Ok(None) => {
            warn!(stop = %stop.name, "No vertex in the main component");
            None
        }
        Err(err) => {
            warn!(stop = %stop.name, error = %err, "Vertex lookup failed");
            None
        }
    }
}

fn route_segment<O: PathOracle>(
    index: usize,
    origin: &Stop,
    destination: &Stop,
    from: Option<VertexRef>,
    to: Option<VertexRef>,
    oracle: &O,
    options: &RouteOptions,
) -> SegmentResult {
    let direct_m = haversine_m(origin.location(), destination.location());

    let path = match (from, to) {
        (Some(from), Some(to)) => match oracle.shortest_path(from.id, to.id) {
            Ok(edges) if edges.is_empty() => Err(FallbackReason::NoPath),
            Ok(edges) => {
                let computed_m: f64 = edges.iter().map(|edge| edge.length_m).sum();
                if computed_m < direct_m * options.circuity_ratio {
                    Ok((edges, computed_m))
                } else {
                    Err(FallbackReason::Implausible { computed_m })
                }
            }
            Err(err) => Err(FallbackReason::OracleError(err.to_string())),
        },
        _ => Err(FallbackReason::VertexNotFound),
    };

    match path {
        Ok((edges, computed_m)) => {
            let streets = named_streets(&edges);
            info!(
                segment = index + 1,
                computed_m = computed_m.round(),
                direct_m = direct_m.round(),
                streets = %streets.iter().take(3).cloned().collect::<Vec<_>>().join(", "),
                "Computed path accepted"
            );
            SegmentResult {
                index,
                direct_m,
                distance_m: computed_m,
                path: SegmentPath::Computed { edges, streets },
            }
        }
        Err(reason) => {
            warn!(segment = index + 1, direct_m = direct_m.round(), reason = ?reason, "Falling back to straight line");
            SegmentResult {
                index,
                direct_m,
                distance_m: direct_m,
                path: SegmentPath::Fallback {
                    geometry: Polyline::straight(origin.location(), destination.location()),
                    reason,
                },
            }
        }
    }
}

fn named_streets(edges: &[RouteEdge]) -> Vec<String> {
    let mut streets: Vec<String> = Vec::new();
    for edge in edges {
        if edge.street_name != UNNAMED_STREET && !streets.contains(&edge.street_name) {
            streets.push(edge.street_name.clone());
        }
    }
    streets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(seq: i32, street: &str, length_m: f64) -> RouteEdge {
        RouteEdge {
            seq,
            geometry: Polyline::default(),
            length_m,
            street_name: street.to_string(),
            road_type: None,
        }
    }

    #[test]
    fn named_streets_are_distinct_and_skip_unnamed() {
        let edges = vec![
            edge(1, "Moneda", 50.0),
            edge(2, UNNAMED_STREET, 10.0),
            edge(3, "Morandé", 80.0),
            edge(4, "Moneda", 20.0),
        ];
        assert_eq!(named_streets(&edges), vec!["Moneda".to_string(), "Morandé".to_string()]);
    }

    #[test]
    fn default_options_match_walking_defaults() {
        let options = RouteOptions::default();
        assert_eq!(options.circuity_ratio, 2.5);
        assert_eq!(options.walking_speed_m_per_min, 83.33);
    }
}
