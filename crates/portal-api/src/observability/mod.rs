//! Observability for the Portal API: Prometheus metrics and helpers.

pub mod metrics;
