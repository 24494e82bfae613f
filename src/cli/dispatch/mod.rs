//! Command-line argument dispatch.
//!
//! This module maps validated CLI arguments onto the appropriate action,
//! currently just starting the API server with its full configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url: auth_opts.frontend_base_url,
        google_client_id: auth_opts.google_client_id,
        google_client_secret: auth_opts.google_client_secret,
        google_ios_client_id: auth_opts.google_ios_client_id,
        google_redirect_uri: auth_opts.google_redirect_uri,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("IDENTITA_PORT", None::<&str>),
                ("IDENTITA_FRONTEND_BASE_URL", None),
                ("IDENTITA_GOOGLE_CLIENT_ID", None),
            ],
            || -> Result<()> {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "identita",
                    "--port",
                    "9090",
                    "--dsn",
                    "postgres://user@localhost:5432/identita",
                    "--google-client-id",
                    "web-id",
                ]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 9090);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/identita");
                assert_eq!(args.google_client_id, "web-id");
                assert_eq!(args.frontend_base_url, "https://identita.dev");
                Ok(())
            },
        )
    }
}
