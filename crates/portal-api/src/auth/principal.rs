//! Principal resolution.
//!
//! The gate never creates or mutates users; it only checks that the token's
//! subject has a row in `users`.

use crate::auth::error::AuthError;
use crate::observability::metrics;
use async_trait::async_trait;
use sqlx::PgPool;
use std::fmt;
use std::time::Instant;
use tracing::instrument;

/// Authenticated user identifier (`users.uid`).
///
/// Inserted into request extensions by the auth middleware. Redacted in
/// Debug output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrincipalId([REDACTED])")
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only lookup of local user records.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Resolve a token subject to a principal, or `None` if no user exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PrincipalLookup` if the store is unavailable.
    async fn resolve(&self, subject: &str) -> Result<Option<PrincipalId>, AuthError>;
}

/// PostgreSQL-backed principal store.
#[derive(Clone)]
pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    #[instrument(skip_all, name = "portal.repo.resolve_principal")]
    async fn resolve(&self, subject: &str) -> Result<Option<PrincipalId>, AuthError> {
        let start = Instant::now();

        let uid: Option<String> = sqlx::query_scalar("SELECT uid FROM users WHERE uid = $1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                metrics::record_db_query("users.find_by_uid", "error", start.elapsed());
                AuthError::PrincipalLookup(e.to_string())
            })?;

        metrics::record_db_query("users.find_by_uid", "success", start.elapsed());
        Ok(uid.map(PrincipalId::new))
    }
}

/// Mock principal store for testing.
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory principal store with a lookup counter.
    pub struct MockPrincipalStore {
        known: HashSet<String>,
        lookup_count: AtomicUsize,
        return_error: bool,
    }

    impl MockPrincipalStore {
        /// A store that knows exactly these subjects.
        pub fn with_principals<I, S>(subjects: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                known: subjects.into_iter().map(Into::into).collect(),
                lookup_count: AtomicUsize::new(0),
                return_error: false,
            }
        }

        /// A store with no users.
        pub fn empty() -> Self {
            Self::with_principals(Vec::<String>::new())
        }

        /// A store whose every lookup fails.
        pub fn failing() -> Self {
            Self {
                known: HashSet::new(),
                lookup_count: AtomicUsize::new(0),
                return_error: true,
            }
        }

        pub fn lookup_count(&self) -> usize {
            self.lookup_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PrincipalStore for MockPrincipalStore {
        async fn resolve(&self, subject: &str) -> Result<Option<PrincipalId>, AuthError> {
            self.lookup_count.fetch_add(1, Ordering::SeqCst);

            if self.return_error {
                return Err(AuthError::PrincipalLookup(
                    "Mock principal store error".to_string(),
                ));
            }

            Ok(self
                .known
                .contains(subject)
                .then(|| PrincipalId::new(subject)))
        }
    }

}
