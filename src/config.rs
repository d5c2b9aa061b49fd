//! Process configuration, read once at startup from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::syllabus::catalog::SubjectCatalog;

const DEFAULT_TEMPLATE_PATH: &str = "static/syllabus_template.docx";
const DEFAULT_OUTPUT_DIR: &str = "static/output";
const DEFAULT_SUBMISSION_LOG: &str = "submissions.csv";
const DEFAULT_CONVERTER: &str = "soffice";
const FONT_SIZE_RANGE_PT: std::ops::RangeInclusive<u32> = 1..=400;
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/login/google/authorized";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
    #[error("{0} must be set when AUTH_ENABLED is true")]
    MissingAuthSetting(&'static str),
    #[error("failed to load subject catalog from {path}: {reason}")]
    Catalog { path: String, reason: String },
}

/// Google OAuth and session settings, present only when login is enabled.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub session_secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub submission_log: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub convert_to_pdf: bool,
    pub converter_program: String,
    pub font_size_pt: u32,
    pub cleanup_delay: Duration,
    pub auth: Option<AuthConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            submission_log: PathBuf::from(DEFAULT_SUBMISSION_LOG),
            catalog_path: None,
            convert_to_pdf: true,
            converter_program: DEFAULT_CONVERTER.to_string(),
            font_size_pt: 12,
            cleanup_delay: Duration::from_secs(5),
            auth: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let auth_enabled = parse_or(&get, "AUTH_ENABLED", false)?;
        let auth = if auth_enabled {
            let required = |key: &'static str| get(key).ok_or(ConfigError::MissingAuthSetting(key));
            Some(AuthConfig {
                client_id: required("GOOGLE_OAUTH_CLIENT_ID")?,
                client_secret: required("GOOGLE_OAUTH_CLIENT_SECRET")?,
                redirect_url: get("OAUTH_REDIRECT_URL")
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
                session_secret: required("SESSION_SECRET")?,
            })
        } else {
            None
        };

        let font_size_pt = parse_or(&get, "SYLLABUS_FONT_SIZE_PT", defaults.font_size_pt)?;
        if !FONT_SIZE_RANGE_PT.contains(&font_size_pt) {
            return Err(ConfigError::Invalid {
                key: "SYLLABUS_FONT_SIZE_PT".to_string(),
                value: font_size_pt.to_string(),
            });
        }

        Ok(Self {
            host: get("SYLLABUS_HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "SYLLABUS_PORT", defaults.port)?,
            template_path: get("SYLLABUS_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_path),
            output_dir: get("SYLLABUS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            submission_log: get("SYLLABUS_SUBMISSION_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.submission_log),
            catalog_path: get("SYLLABUS_CATALOG_PATH").map(PathBuf::from),
            convert_to_pdf: parse_or(&get, "SYLLABUS_CONVERT_TO_PDF", defaults.convert_to_pdf)?,
            converter_program: get("SYLLABUS_CONVERTER").unwrap_or(defaults.converter_program),
            font_size_pt,
            cleanup_delay: Duration::from_secs(parse_or(
                &get,
                "SYLLABUS_CLEANUP_DELAY_SECS",
                defaults.cleanup_delay.as_secs(),
            )?),
            auth,
        })
    }

    pub fn load_catalog(&self) -> Result<SubjectCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => SubjectCatalog::from_json_file(path),
            None => Ok(SubjectCatalog::builtin()),
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth.is_some()
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
