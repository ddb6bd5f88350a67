//! Observability for Causerie: structured logging and optional OpenTelemetry export.

pub mod tracing_setup;
