//! Password login endpoint.

use axum::{Json, extract::Extension, response::IntoResponse};
use sqlx::PgPool;
use tracing::info;

use super::error::AuthError;
use super::password::verify_password;
use super::storage::lookup_login_record;
use super::token::mint_access_token;
use super::types::{IdentityPayload, LoginRequest, TokenResponse};
use super::utils::normalize_email;

/// Validate credentials, enforce the verified-gate, and mint a bearer token.
///
/// Unknown email and wrong password produce the same error. The
/// verified-gate is evaluated only after the password check succeeds, so
/// verification state cannot be probed without knowing the password.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 403, description = "Email not verified", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::InvalidPayload("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(AuthError::InvalidPayload("Missing email or password"));
    }

    let Some(record) = lookup_login_record(&pool, &email).await? else {
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(record.password_hash.as_deref(), &request.password) {
        return Err(AuthError::InvalidCredentials);
    }

    if !record.verified {
        return Err(AuthError::EmailNotVerified);
    }

    let token = mint_access_token(&pool, record.id).await?;
    info!(identity_id = %record.id, "login succeeded");

    Ok(Json(TokenResponse {
        identity: IdentityPayload {
            id: record.id,
            email: record.email,
            display_name: record.display_name,
            verified: record.verified,
            avatar_url: record.avatar_url,
        },
        token,
        token_type: "bearer".to_string(),
    }))
}
