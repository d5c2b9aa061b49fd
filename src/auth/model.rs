use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something that can be signed into a session, whichever provider it came from.
pub trait AuthenticatedIdentity {
    fn id(&self) -> &str;
    fn email(&self) -> &str;
}

/// The signed-in user as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

impl Identity {
    pub fn from_authenticated<T: AuthenticatedIdentity + ?Sized>(user: &T) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
        }
    }
}

impl AuthenticatedIdentity for Identity {
    fn id(&self) -> &str {
        &self.id
    }

    fn email(&self) -> &str {
        &self.email
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("identity provider request failed: {0}")]
    Provider(#[from] reqwest::Error),
    #[error("identity provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("login state does not match")]
    StateMismatch,
    #[error("login is not configured")]
    NotConfigured,
}
