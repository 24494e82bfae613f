//! Password hashing with Argon2id.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a plaintext password into a PHC string for storage.
pub(super) fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a plaintext password against a stored hash.
///
/// A missing hash (social-only identity) or an unparseable hash never
/// verifies. Comparison runs through the hasher, not string equality.
pub(super) fn verify_password(stored: Option<&str>, plaintext: &str) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(Some(&hash), "correct horse battery"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("pw123456").expect("hash");
        assert!(!verify_password(Some(&hash), "pw1234567"));
    }

    #[test]
    fn verify_rejects_missing_or_invalid_hash() {
        assert!(!verify_password(None, "pw123456"));
        assert!(!verify_password(Some("not-a-phc-string"), "pw123456"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("pw123456").expect("hash");
        let second = hash_password("pw123456").expect("hash");
        assert_ne!(first, second);
    }
}
