//! Mail delivery abstraction and the verification email template.
//!
//! Workflows call [`Mailer::send`] strictly after their database transaction
//! has committed. A delivery failure therefore never rolls identity state
//! back; callers surface it separately and the user can retry through the
//! resend endpoint. The sender decides how to deliver (SMTP, API, etc.); the
//! default for local dev is [`LogMailer`], which logs and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

pub const VERIFICATION_SUBJECT: &str = "Your verification code";

/// Email delivery abstraction used by the registration and resend workflows.
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error so the caller can report the
    /// dispatch failure.
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// Local dev mailer that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        info!(
            to = %to,
            subject = %subject,
            body_bytes = html_body.len(),
            "email send stub"
        );
        Ok(())
    }
}

/// Render the verification email body around a 6-digit code.
pub(crate) fn verification_email(display_name: Option<&str>, code: &str) -> String {
    let greeting = display_name.map_or_else(|| "Hello".to_string(), |name| format!("Hello {name}"));
    format!(
        "<html><body>\
         <p>{greeting},</p>\
         <p>Your verification code is:</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{code}</p>\
         <p>The code expires in 15 minutes. If you did not create an account, \
         you can ignore this message.</p>\
         </body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mailer_always_succeeds() {
        assert!(LogMailer.send("a@x.com", "subject", "<p>hi</p>").is_ok());
    }

    #[test]
    fn template_contains_code_and_greeting() {
        let body = verification_email(Some("Alice"), "123456");
        assert!(body.contains("123456"));
        assert!(body.contains("Hello Alice"));

        let body = verification_email(None, "654321");
        assert!(body.contains("654321"));
        assert!(body.contains("Hello,"));
    }
}
