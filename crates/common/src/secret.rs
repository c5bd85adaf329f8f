//! Secret types for keeping credentials out of logs.
//!
//! Re-exports [`secrecy`] so every crate in the workspace uses the same
//! wrapper for the shared token-signing secret and stored service passwords.
//! `SecretString` implements `Debug` with redaction, so deriving `Debug` on a
//! config struct that holds one is safe for `tracing` output.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SharedSecretMode {
//!     issuer: String,
//!     secret: SecretString,
//! }
//!
//! let mode = SharedSecretMode {
//!     issuer: "https://project.supabase.co/auth/v1".to_string(),
//!     secret: SecretString::from("jwt-signing-secret"),
//! };
//!
//! assert!(!format!("{mode:?}").contains("jwt-signing-secret"));
//! assert_eq!(mode.secret.expose_secret(), "jwt-signing-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
