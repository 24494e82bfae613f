//! API handlers and shared validation helpers.

pub mod auth;
pub mod health;
pub mod root;

use regex::Regex;

/// Minimum accepted password length for registration.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Lightweight email sanity check used by auth handlers before persisting
/// data. Input is expected to be normalized already.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Registration password policy: length only, no composition rules.
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("two words@example.com"));
    }

    #[test]
    fn valid_password_checks_length() {
        assert!(valid_password("pw123456"));
        assert!(valid_password("pässwörd"));
        assert!(!valid_password("short"));
        assert!(!valid_password("1234567"));
    }
}
