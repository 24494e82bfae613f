//! Registration endpoint.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::handlers::{valid_email, valid_password};
use crate::api::mail::{VERIFICATION_SUBJECT, verification_email};

use super::error::AuthError;
use super::password::hash_password;
use super::state::AuthState;
use super::storage::{RegisterOutcome, create_identity};
use super::types::{RegisterRequest, RegisterResponse};
use super::utils::normalize_email;

/// Create an unverified identity and send its first verification code.
///
/// No token is issued here; an unverified identity must never hold a bearer
/// token.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity created, verification required", body = RegisterResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 409, description = "Email already registered", body = String),
        (status = 500, description = "Internal failure or email dispatch failure", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::InvalidPayload("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::InvalidPayload("Invalid email"));
    }
    if !valid_password(&request.password) {
        return Err(AuthError::InvalidPayload(
            "Password must be at least 8 characters",
        ));
    }
    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let password_hash = hash_password(&request.password)?;

    match create_identity(&pool, &email, &password_hash, display_name).await? {
        RegisterOutcome::Conflict => {
            warn!(email = %email, "registration attempt with existing email");
            Err(AuthError::DuplicateIdentity(email))
        }
        RegisterOutcome::Created { identity, code } => {
            info!(identity_id = %identity.id, "identity created, verification pending");

            // Dispatch strictly after the committed insert. A failure here
            // leaves the identity and its code in place; resend is the retry
            // path.
            let body = verification_email(identity.display_name.as_deref(), &code);
            auth_state
                .mailer()
                .send(&identity.email, VERIFICATION_SUBJECT, &body)
                .map_err(AuthError::EmailDispatch)?;

            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    identity: identity.into(),
                    requires_verification: true,
                    message:
                        "Registration successful. Please check your email to verify your account."
                            .to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::api::mail::LogMailer;
    use anyhow::Result;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(AuthConfig::new(), Arc::new(LogMailer)))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register(Extension(lazy_pool()?), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() -> Result<()> {
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                email: "not-an-email".to_string(),
                password: "pw123456".to_string(),
                display_name: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_short_password() -> Result<()> {
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                email: "alice@example.com".to_string(),
                password: "short".to_string(),
                display_name: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
