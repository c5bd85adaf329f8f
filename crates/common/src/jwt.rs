//! JWT utilities shared across YNYM Portal crates.
//!
//! This module provides provider-agnostic helpers used before any
//! cryptographic work happens:
//! - Size limits for DoS prevention
//! - Clock skew constants for `exp` leeway
//! - Bearer token extraction from an `Authorization` header value
//! - Key ID extraction from JWT headers
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing here verifies a signature; callers MUST verify after key lookup
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_bearer_token, extract_kid};
//!
//! let token = extract_bearer_token(header_value).ok_or(MissingToken)?;
//! let kid = extract_kid(token)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Identity provider ID tokens are typically 900-1200 bytes (RS256 signature
/// plus profile claims). Anything larger than 8KB is rejected before base64
/// decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default clock skew tolerance applied to `exp` (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Prevents misconfiguration from turning `exp` into a suggestion.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while pre-processing a JWT.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the token from an `Authorization` header value.
///
/// The token is the final whitespace-separated segment of the header, so
/// both `Bearer <token>` and a bare `<token>` yield `<token>`. The scheme is
/// not inspected.
///
/// Returns `None` when the header is absent, empty, or whitespace only.
#[must_use]
pub fn extract_bearer_token(header_value: Option<&str>) -> Option<&str> {
    header_value?.split_whitespace().last()
}

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` if the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// Used to select the provider certificate that signed the token when the
/// provider publishes several at once (key rotation).
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - This function does NOT validate the token signature
/// - The `kid` value should only be used for lookup in a trusted key set
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong structure, bad base64, or invalid JSON header
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    check_token_size(token)?;

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let header_part = parts.next().ok_or(JwtValidationError::MalformedToken)?;
    let part_count = 1 + parts.count();
    if part_count != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = part_count,
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    // Extract kid as string, rejecting empty values
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    Ok(kid)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_clock_skew_bounds() {
        assert_eq!(DEFAULT_CLOCK_SKEW, Duration::from_secs(300));
        assert_eq!(MAX_CLOCK_SKEW, Duration::from_secs(600));
    }

    // -------------------------------------------------------------------------
    // extract_bearer_token Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_bearer_token_with_scheme() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_token_takes_last_segment() {
        assert_eq!(extract_bearer_token(Some("Bearer  extra   tok")), Some("tok"));
        assert_eq!(extract_bearer_token(Some("tok")), Some("tok"));
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        assert_eq!(extract_bearer_token(None), None);
        assert_eq!(extract_bearer_token(Some("")), None);
        assert_eq!(extract_bearer_token(Some("   \t ")), None);
    }

    // -------------------------------------------------------------------------
    // extract_kid Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_kid_valid_token() {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":"test-key-01"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let token = format!("{header_b64}.payload.signature");

        assert_eq!(extract_kid(&token).unwrap(), "test-key-01");
    }

    #[test]
    fn test_extract_kid_missing_kid() {
        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let token = format!("{header_b64}.payload.signature");

        assert!(matches!(
            extract_kid(&token),
            Err(JwtValidationError::MissingKid)
        ));
    }

    #[test]
    fn test_extract_kid_empty_kid_rejected() {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":""}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let token = format!("{header_b64}.payload.signature");

        assert!(matches!(
            extract_kid(&token),
            Err(JwtValidationError::MissingKid)
        ));
    }

    #[test]
    fn test_extract_kid_non_string_kid() {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":12345}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let token = format!("{header_b64}.payload.signature");

        assert!(matches!(
            extract_kid(&token),
            Err(JwtValidationError::MissingKid)
        ));
    }

    #[test]
    fn test_extract_kid_malformed_token() {
        assert!(matches!(
            extract_kid("not-a-jwt"),
            Err(JwtValidationError::MalformedToken)
        ));
        assert!(matches!(
            extract_kid("only.two"),
            Err(JwtValidationError::MalformedToken)
        ));
        assert!(matches!(
            extract_kid("a.b.c.d"),
            Err(JwtValidationError::MalformedToken)
        ));
        assert!(matches!(
            extract_kid(""),
            Err(JwtValidationError::MalformedToken)
        ));
    }

    #[test]
    fn test_extract_kid_invalid_base64() {
        assert!(matches!(
            extract_kid("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        ));
    }

    #[test]
    fn test_extract_kid_invalid_json() {
        let header_b64 = URL_SAFE_NO_PAD.encode("not-json");
        let token = format!("{header_b64}.payload.signature");

        assert!(matches!(
            extract_kid(&token),
            Err(JwtValidationError::MalformedToken)
        ));
    }

    #[test]
    fn test_extract_kid_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert!(matches!(
            extract_kid(&oversized),
            Err(JwtValidationError::TokenTooLarge)
        ));
    }

    #[test]
    fn test_extract_kid_at_size_limit() {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":"key"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        // Need 3 parts: header.payload.signature (2 dots)
        let remaining = MAX_JWT_SIZE_BYTES - header_b64.len() - 2;
        let payload_len = remaining / 2;
        let sig_len = remaining - payload_len;
        let token = format!(
            "{}.{}.{}",
            header_b64,
            "a".repeat(payload_len),
            "b".repeat(sig_len)
        );

        assert_eq!(token.len(), MAX_JWT_SIZE_BYTES);
        assert_eq!(extract_kid(&token).unwrap(), "key");
    }

    #[test]
    fn test_check_token_size() {
        assert!(check_token_size("a.b.c").is_ok());
        assert_eq!(
            check_token_size(&"a".repeat(MAX_JWT_SIZE_BYTES + 1)),
            Err(JwtValidationError::TokenTooLarge)
        );
    }

    #[test]
    fn test_error_messages_are_generic() {
        for err in [
            JwtValidationError::TokenTooLarge,
            JwtValidationError::MalformedToken,
            JwtValidationError::MissingKid,
        ] {
            assert_eq!(err.to_string(), "The access token is invalid or expired");
        }
    }
}
