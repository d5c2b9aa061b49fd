//! Document module - filling `.docx` templates and converting them for distribution.
//!
//! - `xml` - mutable XML tree used to edit WordprocessingML parts
//! - `docx` - zip package access to `word/document.xml`
//! - `filler` - placeholder substitution and syllabus table filling
//! - `converter` - external conversion of the filled document (e.g. to PDF)

pub mod common;
pub mod converter;
pub mod docx;
pub mod filler;
pub mod xml;

pub use converter::{ConversionError, DocumentConverter, SofficeConverter};
pub use docx::DocxPackage;
pub use filler::TemplateFiller;

use thiserror::Error;

/// Errors that can occur while reading, filling or writing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read or write document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid docx package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed document XML: {0}")]
    MalformedXml(String),
    #[error("document part '{0}' is missing")]
    MissingPart(String),
    #[error("document has no body")]
    MissingBody,
    #[error("template has no table")]
    MissingTable,
    #[error("table row {row} has {found} cells, expected at least {expected}")]
    TooFewCells {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("header cell in column {column} has no text run to copy the font from")]
    HeaderCellWithoutRuns { column: usize },
}
