//! Syllabus date sheets: catalog, form handling, row building and generation.

pub mod catalog;
pub mod form_page;
pub mod form_parser;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod rows;

pub use catalog::{Subject, SubjectCatalog};
pub use models::{SyllabusRequest, SyllabusRow};
pub use pipeline::{GenerateError, GeneratedSyllabus, SyllabusPipeline};
