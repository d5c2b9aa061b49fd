//! End-to-end generation of one syllabus document.
//!
//! catalog lookup → row building → template filling → optional conversion.
//! Every request works in its own directory under the output root so
//! concurrent submissions for the same class never share a file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::catalog::SubjectCatalog;
use super::models::{MonthYearLabel, SyllabusRequest, SyllabusRow};
use super::rows::{build_rows, month_year_label, sort_rows, SyllabusError};
use crate::document::common::syllabus_file_stem;
use crate::document::{ConversionError, DocumentConverter, DocumentError, DocxPackage, TemplateFiller};

pub const ASSESSMENT_TOKEN: &str = "{assessment}";
pub const CLASS_TOKEN: &str = "{class}";
pub const MONTH_TOKEN: &str = "(month)";
pub const YEAR_TOKEN: &str = "(year)";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Rows(#[from] SyllabusError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("failed to prepare output directory: {0}")]
    Workspace(#[from] std::io::Error),
}

/// Files produced for one request.
#[derive(Debug, Clone)]
pub struct GeneratedSyllabus {
    pub request_id: Uuid,
    pub work_dir: PathBuf,
    /// The filled template.
    pub document_path: PathBuf,
    /// The file to send: the converted output, or the filled template when
    /// conversion is disabled.
    pub delivered_path: PathBuf,
    pub download_name: String,
    pub rows: Vec<SyllabusRow>,
    pub label: MonthYearLabel,
}

impl GeneratedSyllabus {
    /// Every path to delete once the download has been served.
    pub fn cleanup_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.document_path.clone()];
        if self.delivered_path != self.document_path {
            paths.push(self.delivered_path.clone());
        }
        paths.push(self.work_dir.clone());
        paths
    }
}

pub struct SyllabusPipeline {
    catalog: Arc<SubjectCatalog>,
    template_path: PathBuf,
    output_dir: PathBuf,
    filler: TemplateFiller,
    converter: Option<Arc<dyn DocumentConverter>>,
}

impl SyllabusPipeline {
    pub fn new(
        catalog: Arc<SubjectCatalog>,
        template_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        font_size_pt: u32,
        converter: Option<Arc<dyn DocumentConverter>>,
    ) -> Self {
        Self {
            catalog,
            template_path: template_path.into(),
            output_dir: output_dir.into(),
            filler: TemplateFiller::new(font_size_pt),
            converter,
        }
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    /// Sorted rows and heading label for a request, without touching any file.
    pub fn prepare_rows(
        &self,
        request: &SyllabusRequest,
    ) -> Result<(Vec<SyllabusRow>, MonthYearLabel), SyllabusError> {
        if !self.catalog.contains(&request.class_name) {
            log::warn!(
                "Unknown class '{}', syllabus will have no rows",
                request.class_name
            );
        }
        let subjects = self.catalog.subjects_for(&request.class_name);
        let rows = build_rows(subjects, &request.subject_fields);
        let label = month_year_label(&rows);
        let rows = sort_rows(rows)?;
        Ok((rows, label))
    }

    /// Generate the syllabus document for `request`. Blocking.
    pub fn generate(&self, request: &SyllabusRequest) -> Result<GeneratedSyllabus, GenerateError> {
        let (rows, label) = self.prepare_rows(request)?;

        let mut docx = DocxPackage::open(&self.template_path)?;
        let replaced = self.filler.replace_placeholders(
            &mut docx,
            &[
                (ASSESSMENT_TOKEN, request.assessment_title.as_str()),
                (CLASS_TOKEN, request.class_name.as_str()),
                (MONTH_TOKEN, label.month.as_str()),
                (YEAR_TOKEN, label.year.as_str()),
            ],
        )?;
        self.filler.fill_table(&mut docx, &rows)?;
        log::debug!(
            "Filled template for '{}': {} placeholder runs, {} rows",
            request.class_name,
            replaced,
            rows.len()
        );

        let request_id = Uuid::new_v4();
        let work_dir = self.output_dir.join(request_id.to_string());
        fs::create_dir_all(&work_dir)?;

        match self.write_outputs(&docx, &request.class_name, &work_dir) {
            Ok((document_path, delivered_path)) => {
                let extension = delivered_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "docx".to_string());
                Ok(GeneratedSyllabus {
                    request_id,
                    download_name: format!(
                        "{}.{}",
                        syllabus_file_stem(&request.class_name),
                        extension
                    ),
                    work_dir,
                    document_path,
                    delivered_path,
                    rows,
                    label,
                })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&work_dir) {
                    log::warn!(
                        "Failed to remove {} after error: {}",
                        work_dir.display(),
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    fn write_outputs(
        &self,
        docx: &DocxPackage,
        class_name: &str,
        work_dir: &Path,
    ) -> Result<(PathBuf, PathBuf), GenerateError> {
        let document_path = work_dir.join(format!("{}.docx", syllabus_file_stem(class_name)));
        docx.save(&document_path)?;

        let delivered_path = match &self.converter {
            Some(converter) => converter.convert(&document_path, work_dir)?,
            None => document_path.clone(),
        };
        Ok((document_path, delivered_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syllabus::models::SubjectFields;

    #[test]
    fn test_cleanup_paths_without_conversion() {
        let generated = GeneratedSyllabus {
            request_id: Uuid::nil(),
            work_dir: PathBuf::from("/out/x"),
            document_path: PathBuf::from("/out/x/first-syllabus.docx"),
            delivered_path: PathBuf::from("/out/x/first-syllabus.docx"),
            download_name: "first-syllabus.docx".to_string(),
            rows: Vec::new(),
            label: MonthYearLabel::default(),
        };
        assert_eq!(
            generated.cleanup_paths(),
            vec![
                PathBuf::from("/out/x/first-syllabus.docx"),
                PathBuf::from("/out/x")
            ]
        );
    }

    #[test]
    fn test_prepare_rows_for_unknown_class() {
        let pipeline = SyllabusPipeline::new(
            Arc::new(SubjectCatalog::builtin()),
            "missing.docx",
            "out",
            12,
            None,
        );
        let mut request = SyllabusRequest {
            class_name: "Unknown".to_string(),
            assessment_title: "final".to_string(),
            ..Default::default()
        };
        request.subject_fields.insert(
            "urdu".to_string(),
            SubjectFields {
                date: "not-a-date".to_string(),
                ..Default::default()
            },
        );

        let (rows, label) = pipeline.prepare_rows(&request).unwrap();
        assert!(rows.is_empty());
        assert_eq!(label, MonthYearLabel::default());
    }

    #[test]
    fn test_missing_template_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = SyllabusPipeline::new(
            Arc::new(SubjectCatalog::builtin()),
            dir.path().join("missing.docx"),
            dir.path().join("out"),
            12,
            None,
        );
        let request = SyllabusRequest {
            class_name: "Unknown".to_string(),
            ..Default::default()
        };

        let err = pipeline.generate(&request).unwrap_err();
        assert!(matches!(err, GenerateError::Document(DocumentError::Io(_))));
        assert!(!dir.path().join("out").exists());
    }
}
