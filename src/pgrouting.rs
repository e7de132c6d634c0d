//! PostGIS/pgRouting adapter for vertex lookup and shortest paths.
//!
//! Queries run on a private current-thread tokio runtime so callers stay
//! synchronous; every method is one blocking round-trip to the database.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::runtime::{Builder, Runtime};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::error::Error;
use crate::polyline::Polyline;
use crate::traits::{OracleError, PathOracle, RouteEdge, UNNAMED_STREET, VertexId, VertexLocator, VertexRef};

/// Edges usable for routing: with topology assigned and a positive cost.
const EDGES_SQL: &str =
    "SELECT id, source, target, costo AS cost, reverse_costo AS reverse_cost FROM red_vial WHERE source IS NOT NULL AND target IS NOT NULL AND costo > 0";

const COMPONENT_EDGES_SQL: &str =
    "SELECT id, source, target, costo AS cost FROM red_vial WHERE source IS NOT NULL AND costo > 0";

/// Nearest vertex of the largest connected component. Binds `$1 = lng`, `$2 = lat`.
const NEAREST_VERTEX_QUERY: &str = r#"
WITH components AS (
    SELECT node, component FROM pgr_connectedComponents($sql$ COMPONENT_EDGES $sql$)
), largest AS (
    SELECT component FROM components
    GROUP BY component ORDER BY COUNT(node) DESC LIMIT 1
)
SELECT v.id,
       ST_Distance(v.the_geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_m
FROM red_vial_vertices_pgr v
JOIN components c ON c.node = v.id
JOIN largest l ON l.component = c.component
ORDER BY v.the_geom <-> ST_SetSRID(ST_MakePoint($1, $2), 4326)
LIMIT 1
"#;

/// Undirected Dijkstra between `$1` and `$2`; `$3` names unnamed streets.
const SHORTEST_PATH_QUERY: &str = r#"
WITH path AS (
    SELECT seq, edge FROM pgr_dijkstra($sql$ ROUTING_EDGES $sql$, $1::bigint, $2::bigint, directed := false)
    WHERE edge > 0
)
SELECT p.seq,
       ST_AsGeoJSON(rv.geom) AS geometry,
       COALESCE(rv.length_m, 0)::float8 AS length_m,
       COALESCE(rv.nombre, $3) AS street_name,
       rv.tipo_via AS road_type
FROM path p
JOIN red_vial rv ON rv.id = p.edge
ORDER BY p.seq
"#;

const NETWORK_STATUS_QUERY: &str = r#"
SELECT (SELECT COUNT(*) FROM red_vial WHERE source IS NOT NULL),
       (SELECT COUNT(*) FROM red_vial_vertices_pgr),
       (SELECT COUNT(*) FROM oficinas WHERE activo = true)
"#;

/// Row counts describing whether the road network can be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub edges: i64,
    pub vertices: i64,
    pub offices: i64,
}

impl NetworkStatus {
    /// Fails when the topology has no edges or no vertices.
    pub fn ensure_routable(&self) -> Result<(), Error> {
        if self.edges == 0 || self.vertices == 0 {
            return Err(Error::NetworkNotReady {
                edges: self.edges,
                vertices: self.vertices,
            });
        }
        if self.offices == 0 {
            warn!("No active offices loaded; the route may not match the office catalog");
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct PgRoutingClient {
    pool: PgPool,
    runtime: Runtime,
    nearest_vertex_sql: String,
    shortest_path_sql: String,
}

impl PgRoutingClient {
    /// Connects once, failing immediately if the database is unreachable.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        let runtime = build_runtime()?;
        let pool = runtime.block_on(pool_options(config).connect_with(connect_options(config)))?;
        Ok(Self::with_pool(runtime, pool))
    }

    /// Retries the connection until it succeeds or `ready_timeout_secs` elapses.
    pub fn wait_until_ready(config: &DatabaseConfig) -> Result<Self, Error> {
        let runtime = build_runtime()?;
        let start = Instant::now();
        let timeout = Duration::from_secs(config.ready_timeout_secs);

        loop {
            match runtime.block_on(pool_options(config).connect_with(connect_options(config))) {
                Ok(pool) => {
                    info!(host = %config.host, database = %config.name, "Database is ready");
                    return Ok(Self::with_pool(runtime, pool));
                }
                Err(err) => {
                    let waited = start.elapsed();
                    if waited >= timeout {
                        warn!(error = %err, "Giving up waiting for the database");
                        return Err(Error::DatabaseTimeout(config.ready_timeout_secs));
                    }
                    info!(waited_secs = waited.as_secs(), error = %err, "Waiting for database");
                    std::thread::sleep(Duration::from_secs(config.ready_poll_secs));
                }
            }
        }
    }

    fn with_pool(runtime: Runtime, pool: PgPool) -> Self {
        Self {
            pool,
            runtime,
            nearest_vertex_sql: NEAREST_VERTEX_QUERY.replace("COMPONENT_EDGES", COMPONENT_EDGES_SQL),
            shortest_path_sql: SHORTEST_PATH_QUERY.replace("ROUTING_EDGES", EDGES_SQL),
        }
    }

    pub fn network_status(&self) -> Result<NetworkStatus, Error> {
        let (edges, vertices, offices): (i64, i64, i64) = self
            .runtime
            .block_on(sqlx::query_as(NETWORK_STATUS_QUERY).fetch_one(&self.pool))?;

        let status = NetworkStatus {
            edges,
            vertices,
            offices,
        };
        info!(edges, vertices, offices, "Road network status");
        Ok(status)
    }
}

impl VertexLocator for PgRoutingClient {
    fn nearest_vertex(&self, location: (f64, f64)) -> Result<Option<VertexRef>, OracleError> {
        let (lat, lng) = location;
        let row: Option<(i64, f64)> = self.runtime.block_on(
            sqlx::query_as(&self.nearest_vertex_sql)
                .bind(lng)
                .bind(lat)
                .fetch_optional(&self.pool),
        )?;

        Ok(row.map(|(id, distance_m)| VertexRef { id, distance_m }))
    }
}

impl PathOracle for PgRoutingClient {
    fn shortest_path(&self, source: VertexId, target: VertexId) -> Result<Vec<RouteEdge>, OracleError> {
        let rows: Vec<(i32, Option<String>, f64, String, Option<String>)> = self.runtime.block_on(
            sqlx::query_as(&self.shortest_path_sql)
                .bind(source)
                .bind(target)
                .bind(UNNAMED_STREET)
                .fetch_all(&self.pool),
        )?;

        rows.into_iter()
            .map(|(seq, geometry, length_m, street_name, road_type)| {
                Ok(RouteEdge {
                    seq,
                    geometry: match geometry {
                        Some(text) => parse_line_geometry(&text)?,
                        None => Polyline::default(),
                    },
                    length_m,
                    street_name,
                    road_type,
                })
            })
            .collect()
    }
}

/// Parses `ST_AsGeoJSON` output for a (multi)line into a polyline.
pub fn parse_line_geometry(text: &str) -> Result<Polyline, OracleError> {
    let geometry: geojson::Geometry =
        serde_json::from_str(text).map_err(|e| OracleError::Geometry(e.to_string()))?;

    let positions = match geometry.value {
        geojson::Value::LineString(positions) => positions,
        geojson::Value::MultiLineString(lines) => lines.into_iter().flatten().collect(),
        _ => {
            return Err(OracleError::Geometry(
                "expected a LineString or MultiLineString".to_string(),
            ));
        }
    };

    Polyline::from_positions(&positions)
        .ok_or_else(|| OracleError::Geometry("position with fewer than two ordinates".to_string()))
}

fn build_runtime() -> Result<Runtime, Error> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
}

fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password)
}
