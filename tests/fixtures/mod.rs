//! Test fixtures for ruteo-resiliente.
//!
//! Provides real Santiago Centro office locations and a small street grid
//! around them for the in-memory engine.

pub mod santiago;

pub use santiago::*;
