//! # Portal Test Utilities
//!
//! Shared test utilities for the Portal API.
//!
//! This crate provides:
//! - Fixed RSA signing keys with matching self-signed certificates
//! - Claims builders for certificate and shared-secret tokens
//! - A mock certificate metadata endpoint (`MockCertServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use portal_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let key = primary_key();
//!     let server = MockCertServer::start(&[&key]).await;
//!
//!     let claims = TestClaimsBuilder::certificates(TEST_PROJECT_ID)
//!         .for_user("user-123")
//!         .build();
//!     let token = key.sign(&claims);
//! }
//! ```

pub mod cert_server;
pub mod crypto_fixtures;
pub mod token_builders;

// Re-export commonly used items
pub use cert_server::*;
pub use crypto_fixtures::*;
pub use token_builders::*;
