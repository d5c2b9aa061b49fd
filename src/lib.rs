use actix_web::middleware::{Compress, Logger};
use actix_web::{web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod delivery;
pub mod document;
pub mod state;
pub mod storage;
pub mod syllabus;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::syllabus::handlers::form_page,
        crate::syllabus::handlers::submit_multipart
    ),
    components(schemas(syllabus::models::SyllabusForm, ErrorResponse)),
    tags(
        (name = "Syllabus", description = "Date sheet entry form and document generation.")
    )
)]
pub struct ApiDoc;

/// Register every route of the application.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.configure(syllabus::handlers::config)
        .configure(auth::handlers::config);
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if !config.template_path.exists() {
        log::warn!(
            "Template {} does not exist, submissions will fail",
            config.template_path.display()
        );
    }
    let bind_addr = (config.host.clone(), config.port);
    log::info!(
        "Conversion {}, login {}",
        if config.convert_to_pdf { "enabled" } else { "disabled" },
        if config.auth_enabled() { "enabled" } else { "disabled" }
    );

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to initialise application state: {:#}", e);
            std::process::exit(1);
        }
    };
    let cleanup = state.cleanup.clone();
    let app_state = web::Data::new(state);

    let prometheus = PrometheusMetricsBuilder::new("syllabus_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log::info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(app_state.clone())
            .configure(configure_app)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_addr)?
    .run()
    .await;

    cleanup.flush();
    result
}
