use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Process-wide configuration, loaded once in `main` and handed to each
/// component at construction time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub port: u16,
    pub auth: AuthConfig,
    pub google: GoogleConfig,
    pub mail: Option<MailConfig>,
    pub client_app_url: String,
    pub cors_allowed_origins: Option<String>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub tls: bool,
}

/// Token signing and password hashing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Unset means provider calls wait indefinitely.
    pub http_timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub starttls: bool,
}

// Secrets stay out of `{:?}` output so the config can be logged at startup.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("tls", &self.tls)
            .finish()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_duration_minutes", &self.token_duration_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                tls: parse_flag(&optional("DATABASE_TLS").unwrap_or_else(|| "true".to_string()))
                    .context("DATABASE_TLS must be true or false")?,
            },
            port: optional("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                token_duration_minutes: token_lifetime(optional("ACCESS_TOKEN_EXPIRE_MINUTES"))
                    .context("Invalid ACCESS_TOKEN_EXPIRE_MINUTES")?,
                bcrypt_cost: bcrypt_cost(optional("BCRYPT_COST"))
                    .context("Invalid BCRYPT_COST")?,
            },
            google: GoogleConfig {
                client_id: env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID must be set")?,
                client_secret: env::var("GOOGLE_CLIENT_SECRET")
                    .context("GOOGLE_CLIENT_SECRET must be set")?,
                redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                    .context("GOOGLE_REDIRECT_URI must be set")?,
                http_timeout: optional("OAUTH_HTTP_TIMEOUT_SECS")
                    .map(|v| v.parse().map(Duration::from_secs))
                    .transpose()
                    .context("OAUTH_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            },
            mail: MailConfig::from_env()?,
            client_app_url: optional("CLIENT_APP_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            cors_allowed_origins: optional("CORS_ALLOWED_ORIGINS"),
        })
    }
}

impl MailConfig {
    /// Mail settings are all-or-nothing: without `MAIL_SERVER` outbound
    /// mail is disabled, with it every other `MAIL_*` variable is required.
    fn from_env() -> Result<Option<Self>> {
        let Some(server) = optional("MAIL_SERVER") else {
            return Ok(None);
        };

        Ok(Some(Self {
            server,
            port: env::var("MAIL_PORT")
                .context("MAIL_PORT must be set when MAIL_SERVER is set")?
                .parse()
                .context("MAIL_PORT must be a valid number")?,
            username: env::var("MAIL_USERNAME")
                .context("MAIL_USERNAME must be set when MAIL_SERVER is set")?,
            password: env::var("MAIL_PASSWORD")
                .context("MAIL_PASSWORD must be set when MAIL_SERVER is set")?,
            from: env::var("MAIL_FROM").context("MAIL_FROM must be set when MAIL_SERVER is set")?,
            starttls: parse_flag(
                &env::var("MAIL_TLS").context("MAIL_TLS must be set when MAIL_SERVER is set")?,
            )
            .context("MAIL_TLS must be true or false")?,
        }))
    }
}

/// Longest accepted token lifetime: one year.
const MAX_TOKEN_MINUTES: i64 = 525_600;

/// Token lifetime in minutes, 30 when unset. Must be positive and at most a
/// year so every issued token is valid when issued and `exp` stays in range.
fn token_lifetime(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(30);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a whole number of minutes, got {:?}", raw))?;
    if !(1..=MAX_TOKEN_MINUTES).contains(&minutes) {
        bail!("{} is outside 1..={}", minutes, MAX_TOKEN_MINUTES);
    }
    Ok(minutes)
}

/// bcrypt work factor, `bcrypt::DEFAULT_COST` when unset. The bcrypt crate
/// refuses anything outside 4..=31 at hash time.
fn bcrypt_cost(raw: Option<String>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(bcrypt::DEFAULT_COST);
    };
    let cost: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a whole number, got {:?}", raw))?;
    if !(4..=31).contains(&cost) {
        bail!("{} is outside 4..=31", cost);
    }
    Ok(cost)
}

/// Read an env var, treating an empty value as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn raw(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_parse_flag_is_case_insensitive() {
        assert!(parse_flag("True").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(!parse_flag(" False ").unwrap());
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
        assert!(parse_flag("").is_err());
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let auth = AuthConfig {
            jwt_secret: "super-secret-value".to_string(),
            token_duration_minutes: 30,
            bcrypt_cost: 4,
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_token_lifetime_defaults_to_thirty_minutes() {
        assert_eq!(assert_ok!(token_lifetime(None)), 30);
        assert_eq!(assert_ok!(token_lifetime(raw("1"))), 1);
        assert_eq!(assert_ok!(token_lifetime(raw(" 120 "))), 120);
        assert_eq!(assert_ok!(token_lifetime(raw("525600"))), MAX_TOKEN_MINUTES);
    }

    #[test]
    fn test_token_lifetime_rejects_out_of_range() {
        // Zero or negative would issue tokens that are already expired
        assert_err!(token_lifetime(raw("0")));
        assert_err!(token_lifetime(raw("-5")));
        // Large values overflow the expiry computation at signing time
        assert_err!(token_lifetime(raw("525601")));
        assert_err!(token_lifetime(Some(i64::MAX.to_string())));
        assert_err!(token_lifetime(raw("thirty")));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert_eq!(assert_ok!(bcrypt_cost(None)), bcrypt::DEFAULT_COST);
        assert_eq!(assert_ok!(bcrypt_cost(raw("4"))), 4);
        assert_eq!(assert_ok!(bcrypt_cost(raw("31"))), 31);

        assert_err!(bcrypt_cost(raw("3")));
        assert_err!(bcrypt_cost(raw("32")));
        assert_err!(bcrypt_cost(raw("40")));
        assert_err!(bcrypt_cost(raw("-1")));
    }

    #[test]
    fn test_every_accepted_lifetime_can_sign() {
        let auth = AuthConfig {
            jwt_secret: "secret".to_string(),
            token_duration_minutes: assert_ok!(token_lifetime(raw("525600"))),
            bcrypt_cost: 4,
        };
        assert_ok!(crate::auth::Identity::new(auth).sign("a@example.com"));
    }
}
