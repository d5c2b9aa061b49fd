use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures::StreamExt;
use std::collections::HashMap;

use super::models::{FormFieldError, SyllabusRequest};
use crate::ErrorResponse;

/// Upper bound on the text carried by one form submission.
pub const FORM_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FormParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data in field '{field}': {reason}")]
    Utf8Error { field: String, reason: String },
    #[error("Form fields exceed {limit} bytes")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Missing(#[from] FormFieldError),
}

impl From<FormParseError> for HttpResponse {
    fn from(error: FormParseError) -> Self {
        match error {
            FormParseError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&error.to_string())),
            _ => HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string())),
        }
    }
}

pub struct FormParser;

impl FormParser {
    /// Collect the text fields of a multipart body, at most `limit` bytes
    /// in total. File parts are drained without being kept.
    pub async fn collect_multipart_fields(
        mut multipart: Multipart,
        limit: usize,
    ) -> Result<HashMap<String, String>, FormParseError> {
        let mut fields = HashMap::new();
        let mut total = 0usize;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| FormParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                FormParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| FormParseError::FieldError("Field name not found".to_string()))?
                .to_string();

            if content_disposition.get_filename().is_some() {
                log::debug!("Ignoring file part '{}'", name);
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| FormParseError::IoError(e.to_string()))?;
                }
                continue;
            }

            let mut buffer = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| FormParseError::IoError(e.to_string()))?;
                total += data.len();
                if total > limit {
                    return Err(FormParseError::TooLarge { limit });
                }
                buffer.extend_from_slice(&data);
            }

            let value = String::from_utf8(buffer).map_err(|e| FormParseError::Utf8Error {
                field: name.clone(),
                reason: e.to_string(),
            })?;
            fields.insert(name, value);
        }

        Ok(fields)
    }

    pub async fn parse_multipart(multipart: Multipart) -> Result<SyllabusRequest, FormParseError> {
        let fields = Self::collect_multipart_fields(multipart, FORM_LIMIT_BYTES).await?;
        Ok(SyllabusRequest::from_form_fields(fields)?)
    }
}
