use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::syllabus::models::{SyllabusRequest, SyllabusRow};

/// Append-only CSV log of successful submissions.
pub struct SubmissionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SubmissionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `class, date, day, subject...` for one submission.
    /// Date and day are those of the first row.
    pub fn append(&self, request: &SyllabusRequest, rows: &[SyllabusRow]) -> std::io::Result<()> {
        let (date, day) = rows
            .first()
            .map(|row| (row.date.as_str(), row.day.as_str()))
            .unwrap_or(("", ""));

        let mut fields = vec![request.class_name.as_str(), date, day];
        fields.extend(rows.iter().map(|row| row.subject.as_str()));
        let line = csv_record(&fields);

        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// One CSV record terminated by `\r\n`; fields are quoted only when needed.
pub fn csv_record(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| {
            if field.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}
