use actix_web::HttpRequest;

use super::model::Identity;
use super::session::{decode_session_token, SESSION_COOKIE};
use crate::AppState;

/// Identity of the signed-in user, if the request carries a valid session cookie.
pub fn identity_from_request(req: &HttpRequest, state: &AppState) -> Option<Identity> {
    let auth = state.config.auth.as_ref()?;
    let cookie = req.cookie(SESSION_COOKIE)?;

    match decode_session_token(cookie.value(), &auth.session_secret) {
        Ok(identity) => Some(identity),
        Err(e) => {
            log::warn!("Session validation failed: {}", e);
            None
        }
    }
}

/// Whether the request may use the form. Always true when login is disabled.
pub fn is_authorized(req: &HttpRequest, state: &AppState) -> bool {
    !state.config.auth_enabled() || identity_from_request(req, state).is_some()
}
