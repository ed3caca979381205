//! # Orders Core
//!
//! Core types and error definitions shared by every layer of the order
//! lookup service: the [`Order`] record, the unified [`OrdersError`], and
//! the result alias used across crates.

pub mod error;
pub mod order;
pub mod result;

pub use error::*;
pub use order::*;
pub use result::*;

// Re-export shaku so seam traits can require `Interface`
pub use shaku::Interface;
