use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";
pub const ARG_GOOGLE_IOS_CLIENT_ID: &str = "google-ios-client-id";
pub const ARG_GOOGLE_REDIRECT_URI: &str = "google-redirect-uri";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used as the allowed CORS origin")
                .env("IDENTITA_FRONTEND_BASE_URL")
                .default_value("https://identita.dev"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth web client id")
                .env("IDENTITA_GOOGLE_CLIENT_ID")
                .default_value(""),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth web client secret")
                .env("IDENTITA_GOOGLE_CLIENT_SECRET")
                .default_value(""),
        )
        .arg(
            Arg::new(ARG_GOOGLE_IOS_CLIENT_ID)
                .long(ARG_GOOGLE_IOS_CLIENT_ID)
                .help("Google OAuth iOS client id for mobile PKCE flows")
                .env("IDENTITA_GOOGLE_IOS_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_REDIRECT_URI)
                .long(ARG_GOOGLE_REDIRECT_URI)
                .help("Redirect URI registered with the Google OAuth client")
                .env("IDENTITA_GOOGLE_REDIRECT_URI")
                .default_value("http://localhost:8080/v1/auth/social/google/callback"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub google_ios_client_id: Option<String>,
    pub google_redirect_uri: String,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;
        let google_client_id = matches
            .get_one::<String>(ARG_GOOGLE_CLIENT_ID)
            .cloned()
            .context("missing required argument: --google-client-id")?;
        let google_client_secret = matches
            .get_one::<String>(ARG_GOOGLE_CLIENT_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --google-client-secret")?;
        let google_ios_client_id = matches
            .get_one::<String>(ARG_GOOGLE_IOS_CLIENT_ID)
            .cloned()
            .filter(|id| !id.is_empty());
        let google_redirect_uri = matches
            .get_one::<String>(ARG_GOOGLE_REDIRECT_URI)
            .cloned()
            .context("missing required argument: --google-redirect-uri")?;

        Ok(Self {
            frontend_base_url,
            google_client_id,
            google_client_secret,
            google_ios_client_id,
            google_redirect_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_args() -> Vec<&'static str> {
        vec!["identita", "--dsn", "postgres://localhost/identita"]
    }

    #[test]
    fn defaults_apply() -> Result<()> {
        temp_env::with_vars(
            [
                ("IDENTITA_FRONTEND_BASE_URL", None::<&str>),
                ("IDENTITA_GOOGLE_CLIENT_ID", None),
                ("IDENTITA_GOOGLE_CLIENT_SECRET", None),
                ("IDENTITA_GOOGLE_IOS_CLIENT_ID", None),
                ("IDENTITA_GOOGLE_REDIRECT_URI", None),
            ],
            || -> Result<()> {
                let matches = crate::cli::commands::new().get_matches_from(base_args());
                let options = Options::parse(&matches)?;
                assert_eq!(options.frontend_base_url, "https://identita.dev");
                assert_eq!(options.google_client_id, "");
                assert_eq!(options.google_client_secret.expose_secret(), "");
                assert!(options.google_ios_client_id.is_none());
                assert_eq!(
                    options.google_redirect_uri,
                    "http://localhost:8080/v1/auth/social/google/callback"
                );
                Ok(())
            },
        )
    }

    #[test]
    fn env_overrides_apply() -> Result<()> {
        temp_env::with_vars(
            [
                ("IDENTITA_GOOGLE_CLIENT_ID", Some("web-id")),
                ("IDENTITA_GOOGLE_CLIENT_SECRET", Some("hush")),
                ("IDENTITA_GOOGLE_IOS_CLIENT_ID", Some("ios-id")),
            ],
            || -> Result<()> {
                let matches = crate::cli::commands::new().get_matches_from(base_args());
                let options = Options::parse(&matches)?;
                assert_eq!(options.google_client_id, "web-id");
                assert_eq!(options.google_client_secret.expose_secret(), "hush");
                assert_eq!(options.google_ios_client_id.as_deref(), Some("ios-id"));
                Ok(())
            },
        )
    }
}
