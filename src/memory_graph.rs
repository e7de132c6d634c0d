//! In-memory routing engine backed by petgraph.
//!
//! Mirrors the database engine's semantics: the graph is undirected, only
//! segments with a positive length are routable, and vertex lookup is
//! restricted to the largest connected component.

use std::collections::HashMap;

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::haversine::haversine_m;
use crate::polyline::Polyline;
use crate::traits::{OracleError, PathOracle, RouteEdge, UNNAMED_STREET, VertexId, VertexLocator, VertexRef};

/// Street segment between two vertices.
#[derive(Debug, Clone)]
pub struct StreetSegment {
    pub source: VertexId,
    pub target: VertexId,
    pub length_m: f64,
    pub street_name: Option<String>,
    pub road_type: Option<String>,
    pub geometry: Polyline,
}

#[derive(Debug, Clone)]
struct GraphVertex {
    id: VertexId,
    location: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct MemoryGraph {
    graph: UnGraph<GraphVertex, StreetSegment>,
    index: HashMap<VertexId, NodeIndex>,
    main_component: Vec<NodeIndex>,
}

impl MemoryGraph {
    /// Builds the graph from `(id, (lat, lng))` vertices and street segments.
    ///
    /// Segments with a non-positive length are ignored, like unroutable rows
    /// in the road table.
    pub fn new(vertices: &[(VertexId, (f64, f64))], segments: Vec<StreetSegment>) -> Result<Self, OracleError> {
        let mut graph = UnGraph::with_capacity(vertices.len(), segments.len());
        let mut index = HashMap::with_capacity(vertices.len());

        for &(id, location) in vertices {
            let node = graph.add_node(GraphVertex { id, location });
            index.insert(id, node);
        }

        for segment in segments.into_iter().filter(|segment| segment.length_m > 0.0) {
            let source = *index.get(&segment.source).ok_or(OracleError::UnknownVertex(segment.source))?;
            let target = *index.get(&segment.target).ok_or(OracleError::UnknownVertex(segment.target))?;
            graph.add_edge(source, target, segment);
        }

        let main_component = largest_component(&graph);

        Ok(Self {
            graph,
            index,
            main_component,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn node(&self, id: VertexId) -> Result<NodeIndex, OracleError> {
        self.index.get(&id).copied().ok_or(OracleError::UnknownVertex(id))
    }
}

/// Nodes of the largest component, counting only vertices touched by an edge.
fn largest_component(graph: &UnGraph<GraphVertex, StreetSegment>) -> Vec<NodeIndex> {
    let mut sets = UnionFind::new(graph.node_count());
    for edge in graph.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for node in graph.node_indices() {
        if graph.neighbors(node).next().is_some() {
            *sizes.entry(sets.find(node.index())).or_default() += 1;
        }
    }

    // Ties go to the component with the lowest representative.
    let Some(root) = sizes
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(root, _)| *root)
    else {
        return Vec::new();
    };

    graph
        .node_indices()
        .filter(|node| graph.neighbors(*node).next().is_some() && sets.find(node.index()) == root)
        .collect()
}

impl VertexLocator for MemoryGraph {
    fn nearest_vertex(&self, location: (f64, f64)) -> Result<Option<VertexRef>, OracleError> {
        Ok(self
            .main_component
            .iter()
            .map(|node| {
                let vertex = &self.graph[*node];
                VertexRef {
                    id: vertex.id,
                    distance_m: haversine_m(location, vertex.location),
                }
            })
            .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m)))
    }
}

impl PathOracle for MemoryGraph {
    fn shortest_path(&self, source: VertexId, target: VertexId) -> Result<Vec<RouteEdge>, OracleError> {
        let start = self.node(source)?;
        let goal = self.node(target)?;

        let Some((_, nodes)) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| edge.weight().length_m,
            |_| 0.0,
        ) else {
            return Ok(Vec::new());
        };

        let mut edges = Vec::with_capacity(nodes.len().saturating_sub(1));
        for (position, pair) in nodes.windows(2).enumerate() {
            let Some(segment) = self
                .graph
                .edges_connecting(pair[0], pair[1])
                .map(|edge| edge.weight())
                .min_by(|a, b| a.length_m.total_cmp(&b.length_m))
            else {
                return Ok(Vec::new());
            };

            edges.push(RouteEdge {
                seq: position as i32 + 1,
                geometry: segment.geometry.clone(),
                length_m: segment.length_m,
                street_name: segment.street_name.clone().unwrap_or_else(|| UNNAMED_STREET.to_string()),
                road_type: segment.road_type.clone(),
            });
        }

        Ok(edges)
    }
}
