//! # Orders REST
//!
//! REST lookup surface using Axum.
//! Provides the single-order lookup endpoint, health checks and, when a
//! recorder is installed, the Prometheus scrape endpoint.

pub mod controllers;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
