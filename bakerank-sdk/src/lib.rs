//! Shared types for BakeRank.
//!
//! `objects` holds the JSON shapes exchanged with overlays and control
//! surfaces. The `client` feature adds typed clients for both.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
