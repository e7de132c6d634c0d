//! Routing capabilities consumed by the segment router.
//!
//! The router never searches the graph itself. Concrete engines (pgRouting on
//! PostGIS, the in-memory graph) implement these traits.

use thiserror::Error;

use crate::polyline::Polyline;

/// Street name used when the road network has no name for an edge.
pub const UNNAMED_STREET: &str = "unnamed street";

/// Identifier of a vertex in the routing graph.
pub type VertexId = i64;

/// A graph vertex resolved for a coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRef {
    pub id: VertexId,
    /// Distance in meters from the query coordinate to the vertex.
    pub distance_m: f64,
}

/// One traversed edge of a computed path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEdge {
    /// Position of the edge within the path, as reported by the engine.
    pub seq: i32,
    pub geometry: Polyline,
    pub length_m: f64,
    pub street_name: String,
    pub road_type: Option<String>,
}

/// Failure of a single call into a routing engine.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid edge geometry: {0}")]
    Geometry(String),
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),
}

/// Resolves coordinates to vertices of the largest connected component.
pub trait VertexLocator {
    /// Nearest usable vertex for `(lat, lng)`, or `None` when the coordinate
    /// cannot be attached to the main component.
    fn nearest_vertex(&self, location: (f64, f64)) -> Result<Option<VertexRef>, OracleError>;
}

/// Computes shortest paths between two vertices on the undirected graph.
pub trait PathOracle {
    /// Ordered edges from `source` to `target`. An empty vector means no path.
    fn shortest_path(&self, source: VertexId, target: VertexId) -> Result<Vec<RouteEdge>, OracleError>;
}
