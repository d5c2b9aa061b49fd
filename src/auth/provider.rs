//! External identity providers.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use super::model::{AuthError, AuthenticatedIdentity, Identity};
use crate::config::AuthConfig;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email";

/// An OAuth-style provider: send the user away, get a code back, turn it
/// into an identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_url(&self, state: &str) -> Result<String, AuthError>;
    async fn exchange_code(&self, code: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    #[serde(default)]
    email: String,
}

impl AuthenticatedIdentity for GoogleUserInfo {
    fn id(&self) -> &str {
        &self.sub
    }

    fn email(&self) -> &str {
        &self.email
    }
}

pub struct GoogleProvider {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::ProviderRejected(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<Identity, AuthError> {
        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ProviderRejected(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }
        let token: GoogleToken = response.json().await?;

        let user: GoogleUserInfo = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::info!("Google login for {}", user.email);
        Ok(Identity::from_authenticated(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:8080/login/google/authorized".to_string(),
            session_secret: "session".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_carries_client_and_state() {
        let provider = GoogleProvider::new(&auth_config()).unwrap();
        let url = provider.authorization_url("abc").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "abc");
        assert_eq!(params["response_type"], "code");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:8080/login/google/authorized"
        );
    }

    #[test]
    fn test_google_user_info_becomes_identity() {
        let user: GoogleUserInfo =
            serde_json::from_str(r#"{"sub":"1099","email":"teacher@school.test","name":"T"}"#)
                .unwrap();
        let identity = Identity::from_authenticated(&user);
        assert_eq!(identity.id, "1099");
        assert_eq!(identity.email, "teacher@school.test");
    }
}
