use serde::{Deserialize, Serialize};
use uuid::Uuid;
pub use validator::Validate;

/// Body of `POST /signup`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub id: String,
}

impl SignupResponse {
    pub fn created(id: Uuid) -> Self {
        Self {
            message: "User created successfully".to_string(),
            id: id.to_string(),
        }
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

impl LoginResponse {
    pub fn success(token: String) -> Self {
        Self {
            message: "Login successful".to_string(),
            token,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn test_accepts_common_addresses() {
        assert!(signup("alice@example.com").validate().is_ok());
        assert!(signup("Bob.Smith+tag@mail.example.co.uk").validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for email in ["", "no-at-sign", "two@@example.com", "user @example.com"] {
            let errors = signup(email).validate().unwrap_err();
            assert!(
                errors.field_errors().contains_key("email"),
                "{:?} accepted",
                email
            );
        }
    }

    #[test]
    fn test_login_request_checks_email_only() {
        let ok = LoginRequest {
            email: "user@example.com".to_string(),
            password: String::new(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "user.example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_error_detail_serializes_as_detail_field() {
        let json = serde_json::to_string(&ErrorDetail::new("Invalid credentials")).unwrap();
        assert_eq!(json, r#"{"detail":"Invalid credentials"}"#);
    }

    #[test]
    fn test_signup_response_uses_string_id() {
        let id = Uuid::new_v4();
        let resp = SignupResponse::created(id);
        assert_eq!(resp.id, id.to_string());
        assert_eq!(resp.message, "User created successfully");
    }
}
