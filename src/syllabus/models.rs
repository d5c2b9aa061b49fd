use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

pub const CLASS_NAME_FIELD: &str = "className";
pub const ASSESSMENT_TITLE_FIELD: &str = "assessmentTitle";
pub const DATE_SUFFIX: &str = "Date";
pub const DAY_SUFFIX: &str = "Day";
pub const PORTION_SUFFIX: &str = "Syllabus";

/// Raw per-subject form values, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFields {
    pub date: String,
    pub day: String,
    pub portion: String,
}

/// A validated syllabus submission. Lives only for the duration of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyllabusRequest {
    pub class_name: String,
    pub assessment_title: String,
    pub subject_fields: HashMap<String, SubjectFields>,
}

/// One line of the syllabus table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusRow {
    pub date: String,
    pub day: String,
    pub subject: String,
    pub portion: String,
}

impl SyllabusRow {
    /// Cell values in table column order.
    pub fn cells(&self) -> [&str; 4] {
        [
            self.date.as_str(),
            self.day.as_str(),
            self.subject.as_str(),
            self.portion.as_str(),
        ]
    }
}

/// Month and year printed in the document heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthYearLabel {
    pub month: String,
    pub year: String,
}

impl Default for MonthYearLabel {
    fn default() -> Self {
        Self {
            month: "Month".to_string(),
            year: "Year".to_string(),
        }
    }
}

/// Form layout accepted by `POST /`, documented for the OpenAPI schema.
///
/// Besides the two fixed fields, every subject of the class contributes
/// `{key}Date`, `{key}Day` and `{key}Syllabus` (e.g. `urduDate`).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusForm {
    #[schema(example = "First")]
    pub class_name: String,
    #[schema(example = "Midterm Examination")]
    pub assessment_title: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormFieldError {
    #[error("Missing required field '{0}'")]
    Missing(&'static str),
}

impl SyllabusRequest {
    /// Group flat form fields (`urduDate`, `urduDay`, `urduSyllabus`, ...) by subject key.
    pub fn from_form_fields(mut fields: HashMap<String, String>) -> Result<Self, FormFieldError> {
        let class_name = fields
            .remove(CLASS_NAME_FIELD)
            .ok_or(FormFieldError::Missing(CLASS_NAME_FIELD))?;
        let assessment_title = fields
            .remove(ASSESSMENT_TITLE_FIELD)
            .ok_or(FormFieldError::Missing(ASSESSMENT_TITLE_FIELD))?;

        let mut subject_fields: HashMap<String, SubjectFields> = HashMap::new();
        for (name, value) in fields {
            if let Some(key) = name.strip_suffix(DATE_SUFFIX) {
                subject_fields.entry(key.to_string()).or_default().date = value;
            } else if let Some(key) = name.strip_suffix(DAY_SUFFIX) {
                subject_fields.entry(key.to_string()).or_default().day = value;
            } else if let Some(key) = name.strip_suffix(PORTION_SUFFIX) {
                subject_fields.entry(key.to_string()).or_default().portion = value;
            }
        }

        Ok(Self {
            class_name: class_name.trim().to_string(),
            assessment_title: assessment_title.trim().to_string(),
            subject_fields,
        })
    }
}
