//! Shared helpers for naming generated documents.

use std::path::{Path, PathBuf};

/// Sanitize a string for use in filenames.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        return fallback.to_string();
    }

    sanitize_filename::sanitize(result)
}

/// Base name (without extension) of the files generated for a class.
pub fn syllabus_file_stem(class_name: &str) -> String {
    format!("{}-syllabus", sanitize_filename(class_name, "class"))
}

/// Get the static assets directory path.
pub fn get_static_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("static")
}
