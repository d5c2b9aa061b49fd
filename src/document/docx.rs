//! Read and write `.docx` packages.
//!
//! A package is kept as its ordered list of zip entries; only
//! `word/document.xml` is parsed; every other part is written back byte for byte.

use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::{XmlDocument, XmlElement};
use super::DocumentError;

pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
    document: XmlDocument,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut document = None;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;

            if name == DOCUMENT_PART {
                let xml = String::from_utf8(data.clone()).map_err(|e| {
                    DocumentError::MalformedXml(format!("{DOCUMENT_PART} is not UTF-8: {e}"))
                })?;
                document = Some(XmlDocument::parse(&xml)?);
            }
            parts.push((name, data));
        }

        let document =
            document.ok_or_else(|| DocumentError::MissingPart(DOCUMENT_PART.to_string()))?;
        Ok(Self { parts, document })
    }

    /// The `w:body` element of the main document part.
    pub fn body(&self) -> Result<&XmlElement, DocumentError> {
        self.document
            .root()
            .and_then(|root| root.child("w:body"))
            .ok_or(DocumentError::MissingBody)
    }

    pub fn body_mut(&mut self) -> Result<&mut XmlElement, DocumentError> {
        self.document
            .root_mut()
            .and_then(|root| root.child_mut("w:body"))
            .ok_or(DocumentError::MissingBody)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let document_xml = self.document.to_bytes()?;

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            if name == DOCUMENT_PART {
                zip.write_all(&document_xml)?;
            } else {
                zip.write_all(data)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
