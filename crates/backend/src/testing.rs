//! In-memory stand-ins for the store, the notifier and the OAuth provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::google::{OAuthProvider, ProviderError, ProviderIdentity};
use crate::config::AuthConfig;
use crate::models::{NewUser, UserRecord};
use crate::notifier::Notifier;
use crate::repository::{StoreError, UserStore};

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        token_duration_minutes: 30,
        bcrypt_cost: 4,
    }
}

/// Digest of the record written by the simulated concurrent request.
pub const CONCURRENT_WINNER_DIGEST: &str = "concurrent-winner-digest";

/// Store keyed by exact email, with the same uniqueness rule as the table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
    lookups: AtomicUsize,
    fail_inserts: AtomicBool,
    lose_race: AtomicBool,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Number of `find_by_*` calls served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every later insert fail as if the database went away.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    /// Make the next insert lose to a concurrent request for the same email:
    /// the competitor's record lands between our lookup and our insert.
    pub fn lose_insert_race(&self) {
        self.lose_race.store(true, Ordering::SeqCst);
    }

    fn record(user: NewUser) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            password_digest: user.password_digest,
            display_name: user.display_name,
            external_id: user.external_id,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }

        let mut users = self.users.lock().unwrap();
        if self.lose_race.swap(false, Ordering::SeqCst) {
            let winner = Self::record(NewUser::local(
                user.email.as_str(),
                CONCURRENT_WINNER_DIGEST.to_string(),
            ));
            users.insert(winner.email.clone(), winner);
        }
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let record = Self::record(user);
        let id = record.id;
        users.insert(record.email.clone(), record);
        Ok(id)
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every send; optionally reports each one as failed.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        !self.failing.load(Ordering::SeqCst)
    }
}

enum UserInfoReply {
    Identity(ProviderIdentity),
    Unauthorized,
}

/// Scripted provider: a fixed token reply and a fixed userinfo reply.
pub struct FakeProvider {
    exchange_down: bool,
    access_token: Option<String>,
    userinfo: UserInfoReply,
    exchange_calls: AtomicUsize,
    userinfo_calls: AtomicUsize,
}

impl FakeProvider {
    fn new(access_token: Option<&str>, userinfo: UserInfoReply) -> Self {
        Self {
            exchange_down: false,
            access_token: access_token.map(str::to_string),
            userinfo,
            exchange_calls: AtomicUsize::new(0),
            userinfo_calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(identity: ProviderIdentity) -> Self {
        Self::new(Some("provider-access-token"), UserInfoReply::Identity(identity))
    }

    /// Token endpoint answers `{}`.
    pub fn without_token() -> Self {
        Self::new(None, UserInfoReply::Identity(ProviderIdentity::default()))
    }

    pub fn failing_userinfo() -> Self {
        Self::new(Some("provider-access-token"), UserInfoReply::Unauthorized)
    }

    /// Token endpoint answers 503.
    pub fn failing_exchange() -> Self {
        Self {
            exchange_down: true,
            ..Self::returning(ProviderIdentity::default())
        }
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn userinfo_calls(&self) -> usize {
        self.userinfo_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    async fn exchange_code(&self, _code: &str) -> Result<Option<String>, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.exchange_down {
            return Err(ProviderError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self.access_token.clone())
    }

    async fn fetch_user_info(
        &self,
        access_token: &str,
    ) -> Result<ProviderIdentity, ProviderError> {
        self.userinfo_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(Some(access_token), self.access_token.as_deref());
        match &self.userinfo {
            UserInfoReply::Identity(identity) => Ok(identity.clone()),
            UserInfoReply::Unauthorized => Err(ProviderError::Status {
                status: 401,
                body: "invalid token".to_string(),
            }),
        }
    }
}
