//! # Identita (Identity Lifecycle & Token Issuance)
//!
//! `identita` provisions user identities, gates access behind an
//! email-verification workflow, reconciles identities coming from third-party
//! OAuth providers, and issues opaque bearer tokens.
//!
//! ## Identity lifecycle
//!
//! Identities are created unverified through registration and become verified
//! by consuming a short-lived 6-digit code sent by email. Social sign-in
//! creates identities pre-verified (the provider vouches for the address) or
//! links provider credentials onto an existing password identity with the
//! same email. Once linked, both auth paths work.
//!
//! - **Email normalization:** addresses are trimmed and lower-cased before
//!   every lookup and insert; uniqueness is enforced on the stored form.
//! - **Verification codes:** single use, 15-minute expiry, overwritten (and
//!   thereby voided) by a resend.
//! - **Bearer tokens:** random, stored hashed, 7-day expiry, unrestricted
//!   scope. Several live tokens per identity may coexist; there is no
//!   revocation endpoint.
//!
//! ## Enumeration resistance
//!
//! Login returns the same error for an unknown email and a wrong password,
//! failed verification does not say which part of the guess was wrong, and
//! resend reports a uniform "not eligible" for missing and already-verified
//! accounts alike.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
