//! Token authentication gate.
//!
//! - `certs` - signing certificate fetching and the shared key cache
//! - `verifier` - signature verification (certificate or shared-secret mode)
//! - `claims` - claims model and the issuer/audience/subject policy
//! - `principal` - local user lookup
//! - `gate` - the end-to-end `authenticate` decision

pub mod certs;
pub mod claims;
pub mod error;
pub mod gate;
pub mod principal;
pub mod verifier;

pub use certs::{FetchedKeySet, HttpKeyFetcher, KeyFetcher, SigningKeyCache, SigningKeySet};
pub use claims::{Audience, Claims, ClaimsPolicy};
pub use error::{AuthError, ClaimsViolation};
pub use gate::AuthGate;
pub use principal::{mock::MockPrincipalStore, PgPrincipalStore, PrincipalId, PrincipalStore};
pub use verifier::{build_verifier, CertificateVerifier, SharedSecretVerifier, TokenVerifier};
