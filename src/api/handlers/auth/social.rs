//! Social sign-in: provider token exchange and identity resolution.
//!
//! The provider set is a closed enum; adding one means a new variant plus
//! its exchange/authorize arms. The HTTP exchange with the provider is a
//! boundary concern: once an assertion has been validated it feeds the
//! resolver identically regardless of how it was obtained.

use axum::{
    Json,
    extract::{Extension, Path},
    response::{IntoResponse, Redirect},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use super::error::AuthError;
use super::storage::resolve_social_identity;
use super::token::mint_access_token;
use super::types::{SocialAuthResponse, SocialExchangeRequest};
use super::utils::normalize_email;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Closed set of supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
}

impl Provider {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// A provider-asserted user record, validated at the exchange boundary.
#[derive(Debug, Clone)]
pub struct ProviderAssertion {
    pub subject_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Google OAuth client settings.
#[derive(Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub ios_client_id: Option<String>,
    pub redirect_uri: String,
}

/// Exchanges authorization codes / ID tokens for validated assertions.
pub struct ProviderExchange {
    client: reqwest::Client,
    google: GoogleConfig,
}

/// Google's tokeninfo endpoint serializes booleans inconsistently across
/// flows, so accept both forms.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Text(String),
}

impl BoolLike {
    fn as_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(value) => value == "true",
        }
    }
}

#[derive(Deserialize, Debug)]
struct GoogleTokenInfo {
    sub: String,
    aud: Option<String>,
    email: Option<String>,
    email_verified: Option<BoolLike>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GoogleTokens {
    id_token: Option<String>,
}

impl ProviderExchange {
    /// Build the exchange client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(google: GoogleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;
        Ok(Self { client, google })
    }

    /// Build the provider's authorization URL for the browser redirect flow.
    pub fn authorize_url(&self, provider: Provider) -> Result<String, AuthError> {
        match provider {
            Provider::Google => {
                let mut url = Url::parse(GOOGLE_AUTHORIZE_URL)
                    .map_err(|err| AuthError::Internal(err.into()))?;
                url.query_pairs_mut()
                    .append_pair("client_id", &self.google.client_id)
                    .append_pair("redirect_uri", &self.google.redirect_uri)
                    .append_pair("response_type", "code")
                    .append_pair("scope", "openid email profile");
                Ok(url.into())
            }
        }
    }

    /// Turn an exchange request into a validated provider assertion.
    pub async fn exchange(
        &self,
        provider: Provider,
        request: &SocialExchangeRequest,
    ) -> Result<ProviderAssertion, AuthError> {
        match provider {
            Provider::Google => {
                if let Some(id_token) = request.id_token.as_deref() {
                    return self.verify_google_id_token(id_token).await;
                }
                if let Some(code) = request.code.as_deref() {
                    let id_token = self
                        .exchange_google_code(code, request.code_verifier.as_deref())
                        .await?;
                    return self.verify_google_id_token(&id_token).await;
                }
                Err(AuthError::InvalidPayload(
                    "ID token or authorization code is required",
                ))
            }
        }
    }

    /// Validate an ID token against Google's tokeninfo endpoint.
    ///
    /// tokeninfo checks the signature and expiry; the audience is checked
    /// here against the configured client ids.
    async fn verify_google_id_token(&self, id_token: &str) -> Result<ProviderAssertion, AuthError> {
        let response = self
            .client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|err| {
                warn!("Google tokeninfo request failed: {err}");
                AuthError::InvalidProviderToken
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Google rejected the ID token");
            return Err(AuthError::InvalidProviderToken);
        }

        let info: GoogleTokenInfo = response.json().await.map_err(|err| {
            warn!("Invalid tokeninfo response: {err}");
            AuthError::InvalidProviderToken
        })?;

        if !self.audience_allowed(info.aud.as_deref()) {
            warn!("ID token audience does not match a configured client id");
            return Err(AuthError::InvalidProviderToken);
        }

        Ok(assertion_from_token_info(info))
    }

    /// Exchange an authorization code for tokens and return the ID token.
    ///
    /// Mobile flows send a PKCE `code_verifier`, use the iOS client id, and
    /// omit the client secret.
    async fn exchange_google_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<String, AuthError> {
        let mobile_flow = code_verifier.is_some();
        let client_id = if mobile_flow {
            self.google
                .ios_client_id
                .as_deref()
                .unwrap_or(&self.google.client_id)
        } else {
            &self.google.client_id
        };

        let mut params: Vec<(&str, &str)> = vec![
            ("code", code),
            ("client_id", client_id),
            ("redirect_uri", &self.google.redirect_uri),
            ("grant_type", "authorization_code"),
        ];
        let secret = self.google.client_secret.expose_secret();
        if !mobile_flow {
            params.push(("client_secret", secret));
        }
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier));
        }

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|err| {
                warn!("Google token exchange request failed: {err}");
                AuthError::InvalidProviderToken
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Google token exchange failed");
            return Err(AuthError::InvalidProviderToken);
        }

        let tokens: GoogleTokens = response.json().await.map_err(|err| {
            warn!("Invalid token exchange response: {err}");
            AuthError::InvalidProviderToken
        })?;

        tokens.id_token.ok_or_else(|| {
            warn!("Token exchange response carried no ID token");
            AuthError::InvalidProviderToken
        })
    }

    /// Audience must match a configured client id. With no ids configured
    /// (local dev) the check is skipped.
    fn audience_allowed(&self, aud: Option<&str>) -> bool {
        let mut configured = Vec::with_capacity(2);
        if !self.google.client_id.is_empty() {
            configured.push(self.google.client_id.as_str());
        }
        if let Some(ios) = self.google.ios_client_id.as_deref() {
            if !ios.is_empty() {
                configured.push(ios);
            }
        }
        if configured.is_empty() {
            return true;
        }
        aud.is_some_and(|aud| configured.contains(&aud))
    }
}

fn assertion_from_token_info(info: GoogleTokenInfo) -> ProviderAssertion {
    ProviderAssertion {
        subject_id: info.sub,
        email: info.email,
        email_verified: info.email_verified.is_some_and(|value| value.as_bool()),
        display_name: info.name,
        avatar_url: info.picture,
    }
}

/// Email used for resolution: the asserted address, or a synthesized
/// placeholder when the provider omits one.
fn effective_email(provider: Provider, assertion: &ProviderAssertion) -> String {
    assertion
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| !email.is_empty())
        .unwrap_or_else(|| {
            format!(
                "{}_{}@example.com",
                provider.as_str(),
                assertion.subject_id.to_lowercase()
            )
        })
}

/// Redirect the browser to the provider's authorization page.
#[utoipa::path(
    get,
    path = "/v1/auth/social/{provider}/redirect",
    params(
        ("provider" = String, Path, description = "OAuth provider, e.g. google")
    ),
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 400, description = "Provider not supported", body = String)
    ),
    tag = "auth"
)]
pub async fn social_redirect(
    Path(provider): Path<String>,
    exchange: Extension<Arc<ProviderExchange>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(provider) = Provider::parse(&provider) else {
        return Err(AuthError::InvalidPayload("Provider not supported"));
    };
    let url = exchange.authorize_url(provider)?;
    Ok(Redirect::to(&url))
}

/// Exchange a provider credential for a local identity and bearer token.
///
/// The assertion must carry a provider-verified email; the resolver then
/// reuses, links, or creates the local identity and mints a token either
/// way.
#[utoipa::path(
    post,
    path = "/v1/auth/social/{provider}/exchange",
    request_body = SocialExchangeRequest,
    params(
        ("provider" = String, Path, description = "OAuth provider, e.g. google")
    ),
    responses(
        (status = 200, description = "Authenticated", body = SocialAuthResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Invalid provider token or unverified provider email", body = String)
    ),
    tag = "auth"
)]
pub async fn social_exchange(
    Path(provider): Path<String>,
    pool: Extension<PgPool>,
    exchange: Extension<Arc<ProviderExchange>>,
    payload: Option<Json<SocialExchangeRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(provider) = Provider::parse(&provider) else {
        return Err(AuthError::InvalidPayload("Provider not supported"));
    };
    let Some(Json(request)) = payload else {
        return Err(AuthError::InvalidPayload("Missing payload"));
    };
    if request.id_token.is_none() && request.code.is_none() {
        return Err(AuthError::InvalidPayload(
            "ID token or authorization code is required",
        ));
    }

    let assertion = exchange.exchange(provider, &request).await?;

    // Never trust an address the provider has not verified.
    if !assertion.email_verified {
        return Err(AuthError::ProviderEmailUnverified);
    }

    let email = effective_email(provider, &assertion);
    let (identity, is_new_user) = resolve_social_identity(
        &pool,
        provider.as_str(),
        &assertion.subject_id,
        &email,
        assertion.display_name.as_deref(),
        assertion.avatar_url.as_deref(),
    )
    .await?;

    let token = mint_access_token(&pool, identity.id).await?;
    info!(
        identity_id = %identity.id,
        provider = provider.as_str(),
        is_new_user,
        "social authentication succeeded"
    );

    Ok(Json(SocialAuthResponse {
        identity: identity.into(),
        token,
        token_type: "bearer".to_string(),
        is_new_user,
    }))
}
