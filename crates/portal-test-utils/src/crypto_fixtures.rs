//! Fixed cryptographic fixtures for testing
//!
//! Two RSA-2048 keys, each with a self-signed certificate valid until 2126.
//! `primary` plays the currently published key; `rotated` plays a key the
//! provider has not published (or has already retired).

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};

/// Key id under which the primary certificate is published.
pub const PRIMARY_KID: &str = "primary-2024";

/// Key id under which the rotated certificate is published.
pub const ROTATED_KID: &str = "rotated-2024";

/// Shared secret for HS256 tests.
pub const TEST_SHARED_SECRET: &str = "portal-test-shared-secret-0123456789abcdef";

/// An RSA signing key and the certificate carrying its public half.
#[derive(Debug, Clone, Copy)]
pub struct TestSigningKey {
    pub kid: &'static str,
    pub private_key_pem: &'static str,
    pub certificate_pem: &'static str,
}

pub fn primary_key() -> TestSigningKey {
    TestSigningKey {
        kid: PRIMARY_KID,
        private_key_pem: include_str!("../fixtures/primary_signing_key.pem"),
        certificate_pem: include_str!("../fixtures/primary_certificate.pem"),
    }
}

pub fn rotated_key() -> TestSigningKey {
    TestSigningKey {
        kid: ROTATED_KID,
        private_key_pem: include_str!("../fixtures/rotated_signing_key.pem"),
        certificate_pem: include_str!("../fixtures/rotated_certificate.pem"),
    }
}

impl TestSigningKey {
    /// Sign `claims` with RS256, `kid` set to this key's id.
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_kid(claims, Some(self.kid))
    }

    /// Sign `claims` with RS256 and an arbitrary (or absent) `kid`.
    pub fn sign_with_kid(&self, claims: &Value, kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);

        let key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .expect("fixture signing key must parse");
        encode(&header, claims, &key).expect("fixture token must encode")
    }

    /// HS256 token keyed with this key's certificate PEM, `kid` set to this
    /// key's id. Models an algorithm-confusion attempt.
    pub fn sign_hs256_with_certificate(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.kid.to_string());

        encode(
            &header,
            claims,
            &EncodingKey::from_secret(self.certificate_pem.as_bytes()),
        )
        .expect("fixture token must encode")
    }
}

/// Certificate metadata body (`{kid: pem}`) for the given keys.
pub fn certificates_body(keys: &[&TestSigningKey]) -> Value {
    let map: Map<String, Value> = keys
        .iter()
        .map(|k| (k.kid.to_string(), Value::String(k.certificate_pem.to_string())))
        .collect();
    Value::Object(map)
}

/// Sign `claims` with HS256 and `secret`.
pub fn sign_hs256(claims: &Value, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("fixture token must encode")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::decode_header;
    use serde_json::json;

    #[test]
    fn test_sign_sets_kid_and_algorithm() {
        let token = primary_key().sign(&json!({"sub": "user-123"}));
        let header = decode_header(&token).unwrap();

        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(PRIMARY_KID));
    }

    #[test]
    fn test_sign_without_kid() {
        let token = rotated_key().sign_with_kid(&json!({"sub": "user-123"}), None);
        assert!(decode_header(&token).unwrap().kid.is_none());
    }

    #[test]
    fn test_certificates_body_is_keyed_by_kid() {
        let body = certificates_body(&[&primary_key(), &rotated_key()]);

        assert!(body[PRIMARY_KID]
            .as_str()
            .unwrap()
            .starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(body[ROTATED_KID].is_string());
    }

    #[test]
    fn test_fixtures_are_distinct() {
        assert_ne!(
            primary_key().certificate_pem,
            rotated_key().certificate_pem
        );
    }
}
