//! HTTP API layer for Causerie.
//!
//! Axum-based JSON API at the root path with CORS and request tracing.

pub mod error;
pub mod handlers;
pub mod router;
