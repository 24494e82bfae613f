use crate::api::{
    self,
    handlers::auth::{AuthConfig, AuthState, GoogleConfig, ProviderExchange},
    mail::LogMailer,
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub google_ios_client_id: Option<String>,
    pub google_redirect_uri: String,
}

/// Execute the server action.
///
/// Collaborators are constructed here and handed to the API layer; handlers
/// never reach for ambient globals.
///
/// # Errors
/// Returns an error if the provider exchange client cannot be built or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new().with_frontend_base_url(args.frontend_base_url);
    let auth_state = Arc::new(AuthState::new(auth_config, Arc::new(LogMailer)));

    let exchange = Arc::new(ProviderExchange::new(GoogleConfig {
        client_id: args.google_client_id,
        client_secret: args.google_client_secret,
        ios_client_id: args.google_ios_client_id,
        redirect_uri: args.google_redirect_uri,
    })?);

    api::new(args.port, args.dsn, auth_state, exchange).await
}
