//! Authentication: local signup/login and Google OAuth login.
//!
//! This module provides:
//! - bcrypt password digests and JWT issuance (`Identity`)
//! - the Google provider client behind the `OAuthProvider` trait
//! - the provisioning flow run on the OAuth callback
//! - HTTP handlers for the auth routes

mod flow;
pub mod google;
mod handlers;
mod identity;
mod jwt;
mod password;
pub mod types;

pub use flow::{CallbackOutcome, FlowError, OAuthFlow, ProviderStep};
pub use handlers::{google_callback, google_login, login, signup};
pub use identity::Identity;
pub use types::IdentityError;
