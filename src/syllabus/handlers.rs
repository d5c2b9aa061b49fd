use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{guard, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::collections::HashMap;
use utoipa::IntoParams;

use super::form_page::{render_class_picker, render_subject_form};
use super::form_parser::{FormParseError, FormParser, FORM_LIMIT_BYTES};
use super::models::{SyllabusForm, SyllabusRequest};
use crate::auth::is_authorized;
use crate::delivery::attachment_response;
use crate::{AppState, ErrorResponse};

const LOGIN_PATH: &str = "/login/google";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormPageQuery {
    /// Show the entry fields for this class instead of the class picker.
    pub class: Option<String>,
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(ErrorResponse::new("Forbidden", "Sign in to generate syllabi"))
}

/// Render the entry form
#[utoipa::path(
    get,
    path = "/",
    tag = "Syllabus",
    params(FormPageQuery),
    responses(
        (status = 200, description = "HTML entry form"),
        (status = 302, description = "Login required")
    )
)]
pub async fn form_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FormPageQuery>,
) -> HttpResponse {
    if !is_authorized(&req, &state) {
        return HttpResponse::Found()
            .insert_header((header::LOCATION, LOGIN_PATH))
            .finish();
    }

    let catalog = state.pipeline.catalog();
    let html = match query.class.as_deref().map(str::trim) {
        Some(class) if !class.is_empty() => render_subject_form(catalog, class),
        _ => render_class_picker(catalog),
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

/// Generate a syllabus from a multipart form
#[utoipa::path(
    post,
    path = "/",
    tag = "Syllabus",
    request_body(content = SyllabusForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Generated document as an attachment"),
        (status = 400, description = "Missing or malformed form fields", body = ErrorResponse),
        (status = 403, description = "Login required", body = ErrorResponse),
        (status = 500, description = "Generation or conversion failed", body = ErrorResponse)
    )
)]
pub async fn submit_multipart(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> HttpResponse {
    if !is_authorized(&req, &state) {
        return forbidden();
    }

    match FormParser::parse_multipart(payload).await {
        Ok(request) => generate_and_deliver(&req, &state, request).await,
        Err(e) => {
            log::warn!("Rejected multipart submission: {}", e);
            e.into()
        }
    }
}

/// Same as `submit_multipart` for `application/x-www-form-urlencoded` bodies.
pub async fn submit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    if !is_authorized(&req, &state) {
        return forbidden();
    }

    match SyllabusRequest::from_form_fields(form.into_inner()) {
        Ok(request) => generate_and_deliver(&req, &state, request).await,
        Err(e) => {
            log::warn!("Rejected form submission: {}", e);
            FormParseError::from(e).into()
        }
    }
}

async fn generate_and_deliver(
    req: &HttpRequest,
    state: &AppState,
    request: SyllabusRequest,
) -> HttpResponse {
    let pipeline = state.pipeline.clone();
    let result = web::block(move || {
        let generated = pipeline.generate(&request);
        (request, generated)
    })
    .await;

    let (request, generated) = match result {
        Ok((request, Ok(generated))) => (request, generated),
        Ok((request, Err(e))) => {
            log::error!(
                "Failed to generate syllabus for '{}': {}",
                request.class_name,
                e
            );
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
        Err(e) => {
            log::error!("Generation task failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Generation task failed"));
        }
    };

    log::info!(
        "Generated {} for '{}' ({} rows)",
        generated.download_name,
        request.class_name,
        generated.rows.len()
    );

    if !state.config.auth_enabled() {
        let submissions = state.submissions.clone();
        let rows = generated.rows.clone();
        let logged = web::block(move || submissions.append(&request, &rows)).await;
        match logged {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Failed to record submission: {}", e),
            Err(e) => log::warn!("Submission log task failed: {}", e),
        }
    }

    let response = attachment_response(req, &generated.delivered_path, &generated.download_name);
    state.cleanup.schedule(generated.cleanup_paths());

    match response {
        Ok(response) => response,
        Err(e) => {
            log::error!(
                "Failed to open {}: {}",
                generated.delivered_path.display(),
                e
            );
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to read generated document"))
        }
    }
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    // The parsed essence is lowercase whatever casing the client sent.
    ctx.header::<header::ContentType>()
        .map(|content_type| content_type.0.essence_str() == "multipart/form-data")
        .unwrap_or(false)
}

/// Configure syllabus routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(FORM_LIMIT_BYTES))
        .service(
            web::resource("/")
                .route(web::get().to(form_page))
                .route(
                    web::post()
                        .guard(guard::fn_guard(is_multipart))
                        .to(submit_multipart),
                )
                .route(web::post().to(submit_form)),
        );
}
