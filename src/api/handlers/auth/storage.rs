//! Database helpers for the identity lifecycle.
//!
//! Every read-then-write sequence here either runs inside one transaction
//! (with the row locked) or collapses into a single compare-and-swap
//! statement, so concurrent registrations, verifies, resends, and social
//! logins cannot both win a race on the same identity.

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{generate_verification_code, is_unique_violation};

/// Verification codes live for 15 minutes. Policy constant, not negotiable
/// per call.
const VERIFICATION_CODE_TTL_SECONDS: i64 = 15 * 60;

/// How many times social resolution retries when a concurrent request wins
/// a uniqueness race mid-transaction.
const SOCIAL_RESOLVE_ATTEMPTS: usize = 2;

/// Fields exposed to callers once an identity has been created or mutated.
#[derive(Debug, Clone)]
pub(super) struct IdentityRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) display_name: Option<String>,
    pub(super) verified: bool,
    pub(super) avatar_url: Option<String>,
    pub(super) provider: Option<String>,
}

/// Minimal fields needed to evaluate a password login.
pub(super) struct LoginRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) display_name: Option<String>,
    pub(super) verified: bool,
    pub(super) password_hash: Option<String>,
    pub(super) avatar_url: Option<String>,
}

/// Outcome when attempting to create a new unverified identity.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created {
        identity: IdentityRecord,
        code: String,
    },
    Conflict,
}

/// Outcome for a resend request. `NotEligible` covers both a missing
/// identity and an already-verified one; callers must not tell them apart.
#[derive(Debug)]
pub(super) enum ResendOutcome {
    Refreshed {
        email: String,
        display_name: Option<String>,
        code: String,
    },
    NotEligible,
}

fn identity_from_row(row: &sqlx::postgres::PgRow) -> IdentityRecord {
    IdentityRecord {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        verified: row.get("verified"),
        avatar_url: row.get("avatar_url"),
        provider: row.get("provider"),
    }
}

/// Insert a new unverified identity together with its first verification
/// code.
///
/// The identity row and its code land in one INSERT, so the email-uniqueness
/// race has a single atomic loser: a duplicate insert leaves no partial
/// state behind.
pub(super) async fn create_identity(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    display_name: Option<&str>,
) -> Result<RegisterOutcome> {
    let code = generate_verification_code();

    let query = r"
        INSERT INTO identities
            (id, email, password_hash, display_name, verified,
             verification_code, verification_expires_at)
        VALUES ($1, $2, $3, $4, FALSE, $5, NOW() + ($6 * INTERVAL '1 second'))
        RETURNING id, email, display_name, verified, avatar_url, provider
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .bind(&code)
        .bind(VERIFICATION_CODE_TTL_SECONDS)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegisterOutcome::Created {
            identity: identity_from_row(&row),
            code,
        }),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert identity"),
    }
}

/// Look up login data by normalized email.
pub(super) async fn lookup_login_record(pool: &PgPool, email: &str) -> Result<Option<LoginRecord>> {
    let query = r"
        SELECT id, email, display_name, verified, password_hash, avatar_url
        FROM identities
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    Ok(row.map(|row| LoginRecord {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        verified: row.get("verified"),
        password_hash: row.get("password_hash"),
        avatar_url: row.get("avatar_url"),
    }))
}

/// Consume a verification code and mark the identity verified.
///
/// A single compare-and-swap UPDATE: the row must still carry this exact
/// code, unexpired. Of two concurrent attempts at most one matches; the
/// loser sees `None` because the code has already been cleared. A merely
/// expired code stays stored; only a successful verify or a resend replaces
/// it.
pub(super) async fn consume_verification_code(
    pool: &PgPool,
    email: &str,
    code: &str,
) -> Result<Option<IdentityRecord>> {
    let query = r"
        UPDATE identities
        SET verified = TRUE,
            verification_code = NULL,
            verification_expires_at = NULL,
            updated_at = NOW()
        WHERE email = $1
          AND verification_code = $2
          AND verification_expires_at > NOW()
        RETURNING id, email, display_name, verified, avatar_url, provider
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification code")?;

    Ok(row.map(|row| identity_from_row(&row)))
}

/// Overwrite the pending verification code for an unverified identity.
///
/// The row is locked for the duration of the transaction so a concurrent
/// verify cannot consume the old code after we decided to replace it. The
/// old code is void the instant the new one commits.
pub(super) async fn refresh_verification_code(pool: &PgPool, email: &str) -> Result<ResendOutcome> {
    let mut tx = pool.begin().await.context("begin resend transaction")?;

    let query = r"
        SELECT id, email, display_name, verified
        FROM identities
        WHERE email = $1
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lookup identity for resend")?;

    let Some(row) = row else {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::NotEligible);
    };

    if row.get::<bool, _>("verified") {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::NotEligible);
    }

    let identity_id: Uuid = row.get("id");
    let code = generate_verification_code();

    let query = r"
        UPDATE identities
        SET verification_code = $2,
            verification_expires_at = NOW() + ($3 * INTERVAL '1 second'),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(identity_id)
        .bind(&code)
        .bind(VERIFICATION_CODE_TTL_SECONDS)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to refresh verification code")?;

    tx.commit().await.context("commit resend")?;

    Ok(ResendOutcome::Refreshed {
        email: row.get("email"),
        display_name: row.get("display_name"),
        code,
    })
}

/// Resolve a bearer token hash into its identity.
///
/// Only live tokens count; expired rows are simply never matched (there is
/// no revocation, so nothing else invalidates them early).
pub(super) async fn lookup_identity_by_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<IdentityRecord>> {
    let query = r"
        SELECT identities.id, identities.email, identities.display_name,
               identities.verified, identities.avatar_url, identities.provider
        FROM access_tokens
        JOIN identities ON identities.id = access_tokens.identity_id
        WHERE access_tokens.token_hash = $1
          AND access_tokens.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup identity by token")?;

    Ok(row.map(|row| identity_from_row(&row)))
}

/// Map a provider assertion onto a local identity.
///
/// Resolution order inside one transaction: by (provider, subject), then by
/// email (linking provider credentials onto the existing identity), then
/// create. A uniqueness violation on create means a concurrent request
/// resolved the same person first; the whole resolution is retried once so
/// the loser lands on the winner's row.
pub(super) async fn resolve_social_identity(
    pool: &PgPool,
    provider: &str,
    subject_id: &str,
    email: &str,
    display_name: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<(IdentityRecord, bool)> {
    for _ in 0..SOCIAL_RESOLVE_ATTEMPTS {
        let mut tx = pool.begin().await.context("begin social transaction")?;

        let query = r"
            SELECT id, email, display_name, verified, avatar_url, provider
            FROM identities
            WHERE provider = $1 AND provider_subject_id = $2
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(provider)
            .bind(subject_id)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lookup identity by provider subject")?;

        if let Some(row) = row {
            tx.commit().await.context("commit social lookup")?;
            return Ok((identity_from_row(&row), false));
        }

        let query = r"
            SELECT id
            FROM identities
            WHERE email = $1
            FOR UPDATE
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lookup identity by email")?;

        if let Some(row) = row {
            // Link: the identity keeps any existing password; the provider
            // asserts email ownership, so verification is forced on. The
            // avatar is only backfilled when locally absent.
            let identity_id: Uuid = row.get("id");
            let query = r"
                UPDATE identities
                SET provider = $2,
                    provider_subject_id = $3,
                    avatar_url = COALESCE(avatar_url, $4),
                    verified = TRUE,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, email, display_name, verified, avatar_url, provider
            ";
            let span = tracing::info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "UPDATE",
                db.statement = query
            );
            let row = sqlx::query(query)
                .bind(identity_id)
                .bind(provider)
                .bind(subject_id)
                .bind(avatar_url)
                .fetch_one(&mut *tx)
                .instrument(span)
                .await
                .context("failed to link provider to identity")?;

            tx.commit().await.context("commit social link")?;
            return Ok((identity_from_row(&row), false));
        }

        // Create: provider-asserted identities start verified and carry no
        // password hash until one is explicitly set.
        let query = r"
            INSERT INTO identities
                (id, email, password_hash, display_name, verified,
                 provider, provider_subject_id, avatar_url)
            VALUES ($1, $2, NULL, $3, TRUE, $4, $5, $6)
            RETURNING id, email, display_name, verified, avatar_url, provider
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(display_name)
            .bind(provider)
            .bind(subject_id)
            .bind(avatar_url)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await;

        match row {
            Ok(row) => {
                tx.commit().await.context("commit social create")?;
                return Ok((identity_from_row(&row), true));
            }
            Err(err) if is_unique_violation(&err) => {
                let _ = tx.rollback().await;
            }
            Err(err) => return Err(err).context("failed to create social identity"),
        }
    }

    Err(anyhow!(
        "social identity resolution kept racing with concurrent requests"
    ))
}
