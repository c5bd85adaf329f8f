//! Shared building blocks for the YNYM Portal workspace.

#![warn(clippy::pedantic)]

/// Secret wrappers that keep credentials out of logs
pub mod secret;

/// Bearer token pre-processing (size limits, header parsing, clock skew)
pub mod jwt;
