//! Federated identity (Google OAuth 2.0 authorization-code flow)
//!
//! The provider is behind [`IdentityProvider`] so the login flow can be
//! exercised without network access.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Identity asserted by the provider after a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Provider subject id
    pub subject: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth provider is not configured")]
    NotConfigured,

    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("Provider returned an unusable profile: {0}")]
    Profile(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is redirected to in order to start the login
    fn authorize_url(&self) -> Result<String, OAuthError>;

    /// Exchange the callback `code` for the user's identity
    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, OAuthError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl GoogleOAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

pub struct GoogleProvider {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self) -> Result<String, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| OAuthError::Exchange(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Exchange(format!("{status}: {body}")));
        }
        let token: TokenResponse = response.json().await?;

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = info
            .email
            .filter(|_| info.email_verified)
            .ok_or_else(|| OAuthError::Profile("missing or unverified email".to_string()))?;
        let name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(FederatedIdentity {
            subject: info.sub,
            email,
            name,
            avatar_url: info.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_and_callback() {
        let provider = GoogleProvider::new(GoogleOAuthConfig {
            client_id: "client-1".into(),
            client_secret: "s3cret".into(),
            callback_url: "http://localhost:3000/auth/google/callback".into(),
        });
        let url = provider.authorize_url().unwrap();
        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fcallback"));
        assert!(!url.contains("s3cret"));
    }

    #[test]
    fn unconfigured_provider_refuses() {
        let provider = GoogleProvider::new(GoogleOAuthConfig {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
        });
        assert!(matches!(provider.authorize_url(), Err(OAuthError::NotConfigured)));
    }
}
