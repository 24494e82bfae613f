//! Current-identity endpoint for bearer tokens.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, header::AUTHORIZATION},
    response::IntoResponse,
};
use sqlx::PgPool;

use super::error::AuthError;
use super::storage::lookup_identity_by_token;
use super::types::IdentityPayload;
use super::utils::hash_access_token;

/// Resolve the bearer token into its identity projection.
///
/// Missing, unknown, and expired tokens are indistinguishable to the caller.
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityPayload),
        (status = 401, description = "Missing or invalid bearer token", body = String)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(AuthError::InvalidCredentials);
    };

    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_access_token(&token);
    let Some(identity) = lookup_identity_by_token(&pool, &token_hash).await? else {
        return Err(AuthError::InvalidCredentials);
    };

    Ok(Json(IdentityPayload::from(identity)))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::{HeaderValue, StatusCode};
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[test]
    fn extract_bearer_token_variants() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() -> Result<()> {
        let response = me(HeaderMap::new(), Extension(lazy_pool()?))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
