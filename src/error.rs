use thiserror::Error;

use crate::config::ConfigError;
use crate::router::RouteError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database not reachable after {0}s")]
    DatabaseTimeout(u64),
    #[error("Road network not ready: {edges} routable edges, {vertices} vertices")]
    NetworkNotReady { edges: i64, vertices: i64 },
    #[error("Routing error: {0}")]
    Route(#[from] RouteError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
