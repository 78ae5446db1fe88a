// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// A stored account.
///
/// `email` is the lookup key and is kept exactly as received. `external_id`
/// is the provider subject for accounts provisioned through Google login.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_digest: String,
    pub display_name: Option<String>,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new users; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_digest: String,
    pub display_name: Option<String>,
    pub external_id: Option<String>,
}

impl NewUser {
    /// A local signup: no display name, no external identity.
    pub fn local(email: impl Into<String>, password_digest: String) -> Self {
        Self {
            email: email.into(),
            password_digest,
            display_name: None,
            external_id: None,
        }
    }
}
