use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};

use crate::config::DatabaseConfig;
use crate::models::{NewUser, UserRecord};

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool. Connections are opened lazily on first use.
pub fn establish_connection_pool(config: &DatabaseConfig) -> anyhow::Result<DbPool> {
    let manager = if config.tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            config.url.clone(),
            manager_config,
        )
    } else {
        tracing::warn!("DATABASE_TLS is disabled, connecting to Postgres in plaintext");
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone())
    };

    let pool = Pool::builder(manager).build()?;

    Ok(pool)
}

// User database operations
pub mod users {
    use super::*;
    use crate::schema::users::dsl;

    pub async fn get_by_email(
        conn: &mut AsyncPgConnection,
        email: &str,
    ) -> QueryResult<Option<UserRecord>> {
        dsl::users
            .filter(dsl::email.eq(email))
            .select(UserRecord::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn get_by_external_id(
        conn: &mut AsyncPgConnection,
        external_id: &str,
    ) -> QueryResult<Option<UserRecord>> {
        dsl::users
            .filter(dsl::external_id.eq(external_id))
            .order_by(dsl::created_at.asc())
            .select(UserRecord::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_user: &NewUser,
    ) -> QueryResult<UserRecord> {
        diesel::insert_into(dsl::users)
            .values(new_user)
            .returning(UserRecord::as_returning())
            .get_result(conn)
            .await
    }
}
