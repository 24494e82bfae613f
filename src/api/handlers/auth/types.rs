//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::IdentityRecord;

/// Public projection of an identity. Password hashes and pending
/// verification codes are never serialized outward.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct IdentityPayload {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub verified: bool,
    pub avatar_url: Option<String>,
}

impl From<IdentityRecord> for IdentityPayload {
    fn from(record: IdentityRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            display_name: record.display_name,
            verified: record.verified,
            avatar_url: record.avatar_url,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub identity: IdentityPayload,
    pub requires_verification: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login/verify response carrying a freshly minted bearer token.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub identity: IdentityPayload,
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SocialExchangeRequest {
    pub id_token: Option<String>,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SocialAuthResponse {
    pub identity: IdentityPayload,
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub is_new_user: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn identity_payload_has_no_secret_fields() -> Result<()> {
        let payload = IdentityPayload {
            id: Uuid::nil(),
            email: "alice@example.com".to_string(),
            display_name: Some("Alice".to_string()),
            verified: false,
            avatar_url: None,
        };
        let value = serde_json::to_value(&payload)?;
        let keys: Vec<&str> = value
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(
            keys,
            ["id", "email", "display_name", "verified", "avatar_url"]
        );
        Ok(())
    }

    #[test]
    fn token_response_serializes_bearer_type() -> Result<()> {
        let response = TokenResponse {
            identity: IdentityPayload {
                id: Uuid::nil(),
                email: "alice@example.com".to_string(),
                display_name: None,
                verified: true,
                avatar_url: None,
            },
            token: "raw-token".to_string(),
            token_type: "bearer".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["type"], "bearer");
        assert_eq!(value["token"], "raw-token");
        Ok(())
    }

    #[test]
    fn register_request_round_trips() -> Result<()> {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "Bob@Example.com",
            "password": "pw123456",
        }))?;
        assert_eq!(request.email, "Bob@Example.com");
        assert!(request.display_name.is_none());
        Ok(())
    }

    #[test]
    fn social_exchange_request_accepts_partial_fields() -> Result<()> {
        let request: SocialExchangeRequest = serde_json::from_value(serde_json::json!({
            "code": "4/abc",
        }))?;
        assert!(request.id_token.is_none());
        assert_eq!(request.code.as_deref(), Some("4/abc"));
        assert!(request.code_verifier.is_none());
        Ok(())
    }
}
