//! Shared application state handed to every handler.

use anyhow::Context;
use std::sync::Arc;

use crate::auth::{GoogleProvider, IdentityProvider};
use crate::config::AppConfig;
use crate::delivery::CleanupRegistry;
use crate::document::{DocumentConverter, SofficeConverter};
use crate::storage::SubmissionLog;
use crate::syllabus::catalog::SubjectCatalog;
use crate::syllabus::pipeline::SyllabusPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<SyllabusPipeline>,
    pub cleanup: Arc<CleanupRegistry>,
    pub submissions: Arc<SubmissionLog>,
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    /// Build the state for a configuration, using the external converter
    /// and the Google provider when they are enabled.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let catalog = config.load_catalog()?;
        let converter: Option<Arc<dyn DocumentConverter>> = if config.convert_to_pdf {
            Some(Arc::new(SofficeConverter::new(config.converter_program.clone())))
        } else {
            None
        };
        let identity_provider: Option<Arc<dyn IdentityProvider>> = match &config.auth {
            Some(auth) => Some(Arc::new(
                GoogleProvider::new(auth).context("Failed to create identity provider")?,
            )),
            None => None,
        };

        Ok(Self::with_parts(config, catalog, converter, identity_provider))
    }

    pub fn with_parts(
        config: AppConfig,
        catalog: SubjectCatalog,
        converter: Option<Arc<dyn DocumentConverter>>,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let pipeline = SyllabusPipeline::new(
            Arc::new(catalog),
            config.template_path.clone(),
            config.output_dir.clone(),
            config.font_size_pt,
            converter,
        );

        Self {
            cleanup: CleanupRegistry::new(config.cleanup_delay),
            submissions: Arc::new(SubmissionLog::new(config.submission_log.clone())),
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            identity_provider,
        }
    }
}
