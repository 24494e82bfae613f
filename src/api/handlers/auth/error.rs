//! Workflow error taxonomy and its HTTP mapping.
//!
//! Several variants are deliberately uniform across sub-cases:
//! `InvalidCredentials` does not say whether the email or the password was
//! wrong, `InvalidOrExpiredCode` does not say which part of the guess failed,
//! and `NotEligible` does not distinguish a missing account from an
//! already-verified one. Internal failures are logged with full context and
//! reach the caller as a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email address \"{0}\" is already registered")]
    DuplicateIdentity(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("invalid or expired verification code")]
    InvalidOrExpiredCode,
    #[error("not eligible for a verification resend")]
    NotEligible,
    #[error("provider email unverified")]
    ProviderEmailUnverified,
    #[error("invalid provider token")]
    InvalidProviderToken,
    #[error("email dispatch failed")]
    EmailDispatch(anyhow::Error),
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateIdentity(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::ProviderEmailUnverified | Self::InvalidProviderToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::EmailNotVerified => StatusCode::FORBIDDEN,
            Self::InvalidOrExpiredCode | Self::NotEligible | Self::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailDispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateIdentity(_) => "duplicate_identity",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotVerified => "email_not_verified",
            Self::InvalidOrExpiredCode => "invalid_or_expired_code",
            Self::NotEligible => "not_eligible",
            Self::ProviderEmailUnverified => "provider_email_unverified",
            Self::InvalidProviderToken => "invalid_provider_token",
            Self::EmailDispatch(_) => "email_dispatch_failure",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message presented to the caller; never carries internal detail.
    fn public_message(&self) -> String {
        match self {
            Self::DuplicateIdentity(email) => {
                format!("Email address \"{email}\" is already registered")
            }
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::EmailNotVerified => {
                "Email not verified. Please verify your email before accessing this resource."
                    .to_string()
            }
            Self::InvalidOrExpiredCode => "Invalid or expired verification code".to_string(),
            Self::NotEligible => {
                "Unable to send verification email. User may not exist or is already verified."
                    .to_string()
            }
            Self::ProviderEmailUnverified => {
                "Your email must be verified with your provider to login".to_string()
            }
            Self::InvalidProviderToken => "Invalid provider token".to_string(),
            Self::EmailDispatch(_) => {
                "Failed to send verification email. Please try again later.".to_string()
            }
            Self::InvalidPayload(message) => (*message).to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::EmailDispatch(err) => error!("Email dispatch failed: {err:?}"),
            Self::Internal(err) => error!("Internal failure: {err:?}"),
            _ => {}
        }

        let body = json!({
            "code": self.code(),
            "message": self.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes_follow_the_contract() {
        assert_eq!(
            AuthError::DuplicateIdentity("a@x.com".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::EmailNotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InvalidOrExpiredCode.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::NotEligible.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::ProviderEmailUnverified.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidProviderToken.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::EmailDispatch(anyhow!("smtp down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_identity_names_the_email() {
        let message = AuthError::DuplicateIdentity("a@x.com".to_string()).public_message();
        assert!(message.contains("a@x.com"));
    }

    #[test]
    fn internal_detail_never_leaks() {
        let message = AuthError::Internal(anyhow!("connection to 10.0.0.7 refused")).public_message();
        assert!(!message.contains("10.0.0.7"));
        assert_eq!(message, "Internal server error");
    }

    #[tokio::test]
    async fn response_body_carries_code_and_message() -> anyhow::Result<()> {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["code"], "invalid_credentials");
        assert_eq!(body["message"], "Invalid credentials");
        Ok(())
    }
}
