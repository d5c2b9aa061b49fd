use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use super::model::AuthError;
use super::session::{issue_session_token, SESSION_COOKIE, SESSION_EXPIRY_SECONDS};
use crate::AppState;

pub const STATE_COOKIE: &str = "syllabus_oauth_state";
const STATE_COOKIE_MAX_AGE_MINUTES: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn redirect(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name.to_string(), "").path("/").finish();
    cookie.make_removal();
    cookie
}

fn not_configured() -> HttpResponse {
    HttpResponse::NotFound().json(crate::ErrorResponse::not_found(
        &AuthError::NotConfigured.to_string(),
    ))
}

/// Send the user to the identity provider.
pub async fn login(state: web::Data<AppState>) -> impl Responder {
    let Some(provider) = state.identity_provider.as_ref() else {
        return not_configured();
    };

    let login_state = Uuid::new_v4().to_string();
    let url = match provider.authorization_url(&login_state) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to build authorization URL: {}", e);
            return HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Login unavailable"));
        }
    };

    let state_cookie = Cookie::build(STATE_COOKIE, login_state)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::minutes(STATE_COOKIE_MAX_AGE_MINUTES))
        .finish();

    redirect(&url).cookie(state_cookie).finish()
}

/// Provider callback: check the state, exchange the code and open a session.
pub async fn authorized(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<OAuthCallback>,
) -> impl Responder {
    let (Some(provider), Some(auth)) = (state.identity_provider.as_ref(), state.config.auth.as_ref())
    else {
        return not_configured();
    };

    if let Some(error) = &query.error {
        log::warn!("Identity provider returned an error: {}", error);
        return HttpResponse::Forbidden()
            .json(crate::ErrorResponse::new("Forbidden", "Login was not completed"));
    }

    let expected = req.cookie(STATE_COOKIE).map(|c| c.value().to_string());
    let state_matches = matches!(
        (&expected, &query.state),
        (Some(expected), Some(given)) if expected == given
    );
    if !state_matches {
        log::warn!("{}", AuthError::StateMismatch);
        return HttpResponse::Forbidden().json(crate::ErrorResponse::new(
            "Forbidden",
            &AuthError::StateMismatch.to_string(),
        ));
    }

    let Some(code) = query.code.as_deref() else {
        return HttpResponse::BadRequest()
            .json(crate::ErrorResponse::bad_request("Missing authorization code"));
    };

    let identity = match provider.exchange_code(code).await {
        Ok(identity) => identity,
        Err(e) => {
            log::error!("Code exchange failed: {}", e);
            return HttpResponse::Forbidden()
                .json(crate::ErrorResponse::new("Forbidden", "Login failed"));
        }
    };

    let token = match issue_session_token(&identity, &auth.session_secret) {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to issue session token: {}", e);
            return HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Failed to start session"));
        }
    };

    let session_cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(SESSION_EXPIRY_SECONDS))
        .finish();

    log::info!("Signed in {}", identity.email);
    redirect("/")
        .cookie(session_cookie)
        .cookie(removal_cookie(STATE_COOKIE))
        .finish()
}

pub async fn logout() -> impl Responder {
    redirect("/").cookie(removal_cookie(SESSION_COOKIE)).finish()
}

/// Configure login routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/login/google", web::get().to(login))
        .route("/login/google/authorized", web::get().to(authorized))
        .route("/logout", web::get().to(logout));
}
