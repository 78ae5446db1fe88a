//! Credential store abstraction.
//!
//! Handlers and the OAuth flow talk to [`UserStore`] only, so the Postgres
//! implementation can be swapped for an in-memory one in tests.

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::models::{NewUser, UserRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique constraint on `email` rejected the insert.
    #[error("email already registered")]
    DuplicateEmail,

    /// No connection could be obtained.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::DuplicateEmail
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                StoreError::Unavailable(info.message().to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for StoreError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Collection of user records keyed by email.
///
/// Implementations must enforce email uniqueness at insert time; concurrent
/// first logins for the same address rely on it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Absence is `Ok(None)`, not an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by provider subject. The login flow resolves accounts by
    /// email only; this is kept for callers that need the linkage.
    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record and return its store-assigned id.
    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::users::get_by_email(&mut conn, email).await?)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::users::get_by_external_id(&mut conn, external_id).await?)
    }

    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError> {
        let mut conn = self.pool.get().await?;
        let record = db::users::create(&mut conn, &user).await?;
        tracing::debug!("Inserted user {} ({})", record.id, record.email);
        Ok(record.id)
    }
}
