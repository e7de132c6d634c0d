//! ruteo-resiliente routing stage
//!
//! Routes a multi-office procedure over a road graph, falling back to
//! straight lines when the computed path is missing or implausible.

pub mod traits;
pub mod router;
pub mod pgrouting;
pub mod memory_graph;
pub mod haversine;
pub mod polyline;
pub mod itinerary;
pub mod geojson_output;
pub mod config;
pub mod error;
pub mod pipeline;

pub use error::Error;
