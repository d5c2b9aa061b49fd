//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use zip::write::FileOptions;
use zip::ZipWriter;

use syllabus_server::auth::{AuthError, Identity, IdentityProvider};
use syllabus_server::config::{AppConfig, AuthConfig};
use syllabus_server::document::converter::expected_output;
use syllabus_server::document::xml::XmlElement;
use syllabus_server::document::{ConversionError, DocumentConverter, DocxPackage};
use syllabus_server::syllabus::SubjectCatalog;
use syllabus_server::AppState;

pub const SESSION_SECRET: &str = "integration-session-secret";

fn header_cell(text: &str) -> String {
    format!(
        r#"<w:tc><w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/></w:rPr><w:t>{text}</w:t></w:r></w:p></w:tc>"#
    )
}

/// A minimal template with the heading placeholders and a header-only table.
pub fn template_bytes() -> Vec<u8> {
    let header: String = ["Date", "Day", "Subject", "Syllabus"]
        .iter()
        .map(|t| header_cell(t))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{{class}}</w:t></w:r></w:p><w:p><w:r><w:t>{{assessment}} </w:t></w:r><w:r><w:t>(month) (year)</w:t></w:r></w:p><w:tbl><w:tblPr/><w:tr>{header}</w:tr></w:tbl><w:sectPr/></w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", FileOptions::default())
        .unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    zip.start_file("word/document.xml", FileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

pub fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("template.docx");
    std::fs::write(&path, template_bytes()).unwrap();
    path
}

/// Configuration rooted in `dir`, with conversion left to the caller.
pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        template_path: write_template(dir),
        output_dir: dir.join("output"),
        submission_log: dir.join("submissions.csv"),
        convert_to_pdf: false,
        cleanup_delay: Duration::from_millis(100),
        ..AppConfig::default()
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_url: "http://localhost:8080/login/google/authorized".to_string(),
        session_secret: SESSION_SECRET.to_string(),
    }
}

pub fn app_state(
    config: AppConfig,
    converter: Option<Arc<dyn DocumentConverter>>,
    provider: Option<Arc<dyn IdentityProvider>>,
) -> AppState {
    AppState::with_parts(config, SubjectCatalog::builtin(), converter, provider)
}

/// Pretends to convert by copying the input to `<stem>.pdf`.
pub struct CopyConverter;

impl DocumentConverter for CopyConverter {
    fn target_extension(&self) -> &str {
        "pdf"
    }

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let output = expected_output(input, out_dir, self.target_extension());
        std::fs::copy(input, &output).map_err(|source| ConversionError::Spawn {
            program: "copy".to_string(),
            source,
        })?;
        Ok(output)
    }
}

/// A converter that runs but never writes its output.
pub struct SilentConverter;

impl DocumentConverter for SilentConverter {
    fn target_extension(&self) -> &str {
        "pdf"
    }

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        Err(ConversionError::ConversionFailed {
            expected: expected_output(input, out_dir, self.target_extension()),
        })
    }
}

/// Accepts the code `good-code` and nothing else.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://provider.test/authorize?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<Identity, AuthError> {
        if code == "good-code" {
            Ok(Identity {
                id: "user-42".to_string(),
                email: "teacher@school.test".to_string(),
            })
        } else {
            Err(AuthError::ProviderRejected("bad code".to_string()))
        }
    }
}

fn deep_text(el: &XmlElement, out: &mut String) {
    if el.is("w:t") {
        out.push_str(&el.text());
    }
    for child in el.elements() {
        deep_text(child, out);
    }
}

/// Cell texts of every table row, header included.
pub fn table_rows(docx: &DocxPackage) -> Vec<Vec<String>> {
    let table = docx.body().unwrap().find("w:tbl").unwrap();
    table
        .children_named("w:tr")
        .map(|tr| {
            tr.children_named("w:tc")
                .map(|tc| {
                    let mut text = String::new();
                    deep_text(tc, &mut text);
                    text
                })
                .collect()
        })
        .collect()
}

/// Text of every paragraph outside the table.
pub fn heading_text(docx: &DocxPackage) -> String {
    let mut text = String::new();
    for paragraph in docx.body().unwrap().children_named("w:p") {
        deep_text(paragraph, &mut text);
        text.push('\n');
    }
    text
}
