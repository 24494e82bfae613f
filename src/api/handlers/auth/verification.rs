//! Email verification endpoints.

use axum::{Json, extract::Extension, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::api::handlers::valid_email;
use crate::api::mail::{VERIFICATION_SUBJECT, verification_email};

use super::error::AuthError;
use super::state::AuthState;
use super::storage::{ResendOutcome, consume_verification_code, refresh_verification_code};
use super::token::mint_access_token;
use super::types::{
    ResendVerificationRequest, ResendVerificationResponse, TokenResponse, VerifyEmailRequest,
};
use super::utils::normalize_email;

/// Consume a verification code, mark the identity verified, and mint its
/// first bearer token.
///
/// Wrong code, expired code, and unknown email are indistinguishable to the
/// caller.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = TokenResponse),
        (status = 400, description = "Invalid or expired verification code", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::InvalidPayload("Missing payload"));
    };

    let email = normalize_email(&request.email);
    let code = request.code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(AuthError::InvalidPayload(
            "Email and verification code are required",
        ));
    }

    let Some(identity) = consume_verification_code(&pool, &email, code).await? else {
        return Err(AuthError::InvalidOrExpiredCode);
    };

    let token = mint_access_token(&pool, identity.id).await?;
    info!(identity_id = %identity.id, "email verified");

    Ok(Json(TokenResponse {
        identity: identity.into(),
        token,
        token_type: "bearer".to_string(),
    }))
}

/// Replace the pending verification code and send it again.
///
/// A missing identity and an already-verified one both yield the same
/// `not_eligible` outcome so the endpoint cannot be used to enumerate
/// accounts.
#[utoipa::path(
    post,
    path = "/v1/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification code sent", body = ResendVerificationResponse),
        (status = 400, description = "Not eligible", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::InvalidPayload("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::InvalidPayload("Invalid email"));
    }

    match refresh_verification_code(&pool, &email).await? {
        ResendOutcome::NotEligible => Err(AuthError::NotEligible),
        ResendOutcome::Refreshed {
            email,
            display_name,
            code,
        } => {
            // The new code is already committed; dispatch happens after the
            // fact and its failure does not roll the code back.
            let body = verification_email(display_name.as_deref(), &code);
            auth_state
                .mailer()
                .send(&email, VERIFICATION_SUBJECT, &body)
                .map_err(AuthError::EmailDispatch)?;

            Ok(Json(ResendVerificationResponse {
                success: true,
                message: "Verification code sent successfully".to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::api::mail::LogMailer;
    use anyhow::Result;
    use axum::http::StatusCode;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(AuthConfig::new(), Arc::new(LogMailer)))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn verify_email_missing_payload() -> Result<()> {
        let response = verify_email(Extension(lazy_pool()?), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_email_empty_code() -> Result<()> {
        let response = verify_email(
            Extension(lazy_pool()?),
            Some(Json(VerifyEmailRequest {
                email: "alice@example.com".to_string(),
                code: " ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_missing_payload() -> Result<()> {
        let response = resend_verification(Extension(lazy_pool()?), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_rejects_invalid_email() -> Result<()> {
        let response = resend_verification(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(ResendVerificationRequest {
                email: "not-an-email".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
