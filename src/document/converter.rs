//! External conversion of a filled document into a distributable format.
//!
//! Conversion is one blocking call to a host-provided program (LibreOffice
//! by default). There is no retry; the only success criterion is that the
//! expected output file exists once the program returns.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to run converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to prepare converter profile: {0}")]
    Profile(#[source] std::io::Error),
    #[error("conversion produced no output at {}", .expected.display())]
    ConversionFailed { expected: PathBuf },
}

/// Converts a document file into another format.
pub trait DocumentConverter: Send + Sync {
    /// File extension of the converted output, e.g. `pdf`.
    fn target_extension(&self) -> &str;

    /// Convert `input`, writing the result into `out_dir`, and return its path.
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError>;
}

/// Path the converter is expected to write for `input`.
pub fn expected_output(input: &Path, out_dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{stem}.{extension}"))
}

/// Headless LibreOffice (`soffice --convert-to`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: String,
    target: String,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            target: "pdf".to_string(),
        }
    }
}

impl DocumentConverter for SofficeConverter {
    fn target_extension(&self) -> &str {
        &self.target
    }

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let expected = expected_output(input, out_dir, &self.target);

        // Private profile per call; instances sharing a profile block each other.
        let profile = tempdir().map_err(ConversionError::Profile)?;
        let profile_url = reqwest::Url::from_directory_path(profile.path())
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("file://{}", profile.path().display()));

        log::debug!(
            "Converting {} to {} with {}",
            input.display(),
            self.target,
            self.program
        );

        let status = Command::new(&self.program)
            .arg("--headless")
            .arg(format!("-env:UserInstallation={profile_url}"))
            .arg("--convert-to")
            .arg(&self.target)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .status()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            log::warn!(
                "Converter '{}' exited with status {}",
                self.program,
                status.code().unwrap_or(-1)
            );
        }

        if !expected.exists() {
            log::error!("Conversion output missing: {}", expected.display());
            return Err(ConversionError::ConversionFailed { expected });
        }

        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output() {
        assert_eq!(
            expected_output(Path::new("/tmp/a/first-syllabus.docx"), Path::new("/out"), "pdf"),
            PathBuf::from("/out/first-syllabus.pdf")
        );
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.docx");
        std::fs::write(&input, b"x").unwrap();

        let err = SofficeConverter::new("definitely-not-a-converter-binary")
            .convert(&input, dir.path())
            .unwrap_err();
        assert!(matches!(err, ConversionError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_without_output_is_conversion_failed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.docx");
        std::fs::write(&input, b"x").unwrap();

        let err = SofficeConverter::new("true")
            .convert(&input, dir.path())
            .unwrap_err();
        match err {
            ConversionError::ConversionFailed { expected } => {
                assert_eq!(expected, dir.path().join("in.pdf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_program_writing_output_succeeds() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-soffice");
        std::fs::write(
            &script,
            "#!/bin/sh\nwhile [ $# -gt 1 ]; do\n  if [ \"$1\" = \"--outdir\" ]; then out=\"$2\"; fi\n  shift\ndone\nname=$(basename \"$1\")\ncp \"$1\" \"$out/${name%.*}.pdf\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let input = dir.path().join("first-syllabus.docx");
        std::fs::write(&input, b"document").unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let converter = SofficeConverter::new(script.to_string_lossy().into_owned());
        let output = converter.convert(&input, &out_dir).unwrap();

        assert_eq!(output, out_dir.join("first-syllabus.pdf"));
        assert_eq!(std::fs::read(&output).unwrap(), b"document");
        assert_eq!(converter.target_extension(), "pdf");
    }
}
