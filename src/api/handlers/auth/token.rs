//! Bearer token issuance.
//!
//! Tokens are opaque: 32 random bytes, returned to the caller exactly once
//! and stored only as a SHA-256 hash. Every login/verify/social event mints
//! an independent token; several live tokens per identity may coexist and
//! there is no revocation or refresh path.

use anyhow::{Context, Result, anyhow};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{generate_access_token, hash_access_token};

/// Fixed 7-day token lifetime.
const ACCESS_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Unrestricted capability scope.
const ACCESS_TOKEN_SCOPE: &str = "*";

/// Mint a bearer token bound to an identity and return the raw value.
pub(super) async fn mint_access_token(pool: &PgPool, identity_id: Uuid) -> Result<String> {
    let query = r"
        INSERT INTO access_tokens (identity_id, token_hash, scope, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_access_token()?;
        let token_hash = hash_access_token(&token);
        let result = sqlx::query(query)
            .bind(identity_id)
            .bind(token_hash)
            .bind(ACCESS_TOKEN_SCOPE)
            .bind(ACCESS_TOKEN_TTL_SECONDS)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if super::utils::is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert access token"),
        }
    }

    Err(anyhow!("failed to generate unique access token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_seven_days() {
        assert_eq!(ACCESS_TOKEN_TTL_SECONDS, 604_800);
    }

    #[test]
    fn scope_is_unrestricted() {
        assert_eq!(ACCESS_TOKEN_SCOPE, "*");
    }
}
