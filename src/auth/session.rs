use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::model::{AuthError, AuthenticatedIdentity, Identity, SessionClaims};

pub const SESSION_COOKIE: &str = "syllabus_session";
pub const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60; // 12 hours

/// Sign a session token for `user`.
pub fn issue_session_token<T: AuthenticatedIdentity + ?Sized>(
    user: &T,
    secret: &str,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = SessionClaims {
        sub: user.id().to_string(),
        email: user.email().to_string(),
        iat: now,
        exp: now + SESSION_EXPIRY_SECONDS as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate a session token and return the identity it carries.
pub fn decode_session_token(token: &str, secret: &str) -> Result<Identity, AuthError> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims.into())
}
