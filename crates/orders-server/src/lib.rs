//! # Orders Server Library
//!
//! Component wiring and startup utilities for the order lookup server.

pub mod di;
pub mod startup;
