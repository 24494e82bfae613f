//! Auth configuration and shared state.

use std::sync::Arc;

use crate::api::mail::Mailer;

const DEFAULT_FRONTEND_BASE_URL: &str = "https://identita.dev";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, frontend_base_url: String) -> Self {
        self.frontend_base_url = frontend_base_url;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state injected into every auth handler. Collaborators arrive here
/// from the server action, never from ambient globals.
pub struct AuthState {
    config: AuthConfig,
    mailer: Arc<dyn Mailer>,
}

impl AuthState {
    pub fn new(config: AuthConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, mailer }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mail::LogMailer;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();
        assert_eq!(config.frontend_base_url(), DEFAULT_FRONTEND_BASE_URL);

        let config = config.with_frontend_base_url("https://app.test".to_string());
        assert_eq!(config.frontend_base_url(), "https://app.test");
    }

    #[test]
    fn auth_state_exposes_collaborators() {
        let state = AuthState::new(AuthConfig::new(), Arc::new(LogMailer));
        assert_eq!(state.config().frontend_base_url(), DEFAULT_FRONTEND_BASE_URL);
        assert!(state.mailer().send("a@x.com", "subject", "<p>body</p>").is_ok());
    }
}
