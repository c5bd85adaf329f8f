//! YNYM Portal API Library
//!
//! A personal multi-tenant CRUD API for tasks, task lists, cars, refueling
//! logs, notes and stored credentials. Every resource is scoped by the
//! principal resolved from a third-party identity token.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs (AuthGate) -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Token authentication gate, signing key cache, verifiers
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth and HTTP metrics middleware
//! - `models` - Row and request body types
//! - `observability` - Prometheus metrics
//! - `repositories` - PostgreSQL access, scoped by `uid`
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
