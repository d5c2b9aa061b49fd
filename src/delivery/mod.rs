//! Delivery of generated documents: the download response and deferred cleanup.

pub mod cleanup;

pub use cleanup::CleanupRegistry;

use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse};
use std::path::Path;

/// Stream `path` from disk as an attachment named `download_name`.
pub fn attachment_response(
    req: &HttpRequest,
    path: &Path,
    download_name: &str,
) -> std::io::Result<HttpResponse> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let file = NamedFile::open(path)?
        .set_content_type(mime)
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(download_name.to_string())],
        });
    Ok(file.into_response(req))
}
