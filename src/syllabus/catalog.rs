//! Static mapping from class name to the ordered subjects examined in that class.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// A subject as it appears in the syllabus table and in the form field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Form field prefix, e.g. `mathematics` for `mathematicsDate`.
    pub key: String,
    /// Display name written into the table.
    pub name: String,
}

impl Subject {
    pub fn new(name: &str) -> Self {
        Self {
            key: subject_key(name),
            name: name.to_string(),
        }
    }
}

/// Derive the form field prefix of a subject name.
pub fn subject_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    classes: Vec<CatalogClass>,
}

#[derive(Debug, Deserialize)]
struct CatalogClass {
    name: String,
    subjects: Vec<String>,
}

/// Read-only class catalog, built once at startup.
#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    classes: Vec<(String, Vec<Subject>)>,
}

impl SubjectCatalog {
    pub fn new(classes: Vec<(String, Vec<Subject>)>) -> Self {
        Self { classes }
    }

    /// The catalog used when no catalog file is configured.
    pub fn builtin() -> Self {
        const CLASSES: &[(&str, &[&str])] = &[
            ("Playgroup", &["English", "Urdu", "Mathematics"]),
            (
                "Nursery",
                &["English", "Urdu", "Mathematics", "General Knowledge"],
            ),
            (
                "Prep",
                &[
                    "English",
                    "Urdu",
                    "Mathematics",
                    "General Knowledge",
                    "Islamiat",
                ],
            ),
            ("First", &["Urdu", "English", "Mathematics"]),
            (
                "Second",
                &[
                    "Urdu",
                    "English",
                    "Mathematics",
                    "Islamiat",
                    "General Knowledge",
                ],
            ),
            (
                "Third",
                &[
                    "Urdu",
                    "English",
                    "Mathematics",
                    "Islamiat",
                    "Science",
                    "Social Studies",
                ],
            ),
            (
                "Fourth",
                &[
                    "Urdu",
                    "English",
                    "Mathematics",
                    "Islamiat",
                    "Science",
                    "Social Studies",
                    "Computer",
                ],
            ),
            (
                "Fifth",
                &[
                    "Urdu",
                    "English",
                    "Mathematics",
                    "Islamiat",
                    "Science",
                    "Social Studies",
                    "Computer",
                ],
            ),
        ];

        let classes = CLASSES
            .iter()
            .map(|(name, subjects)| {
                (
                    name.to_string(),
                    subjects.iter().map(|s| Subject::new(s)).collect(),
                )
            })
            .collect();

        Self { classes }
    }

    /// Load a catalog from a JSON file of the form
    /// `{"classes":[{"name":"First","subjects":["Urdu","English"]}]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Catalog {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&raw).map_err(|reason| ConfigError::Catalog {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let file: CatalogFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let mut seen = HashSet::new();
        let mut classes = Vec::with_capacity(file.classes.len());
        for class in file.classes {
            if !seen.insert(class.name.clone()) {
                return Err(format!("duplicate class '{}'", class.name));
            }
            let subjects = class.subjects.iter().map(|s| Subject::new(s)).collect();
            classes.push((class.name, subjects));
        }

        Ok(Self { classes })
    }

    /// Ordered subjects of `class_name`. Unknown classes yield an empty slice,
    /// which downstream produces a document with no filled rows.
    pub fn subjects_for(&self, class_name: &str) -> &[Subject] {
        self.classes
            .iter()
            .find(|(name, _)| name == class_name)
            .map(|(_, subjects)| subjects.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.iter().any(|(name, _)| name == class_name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(name, _)| name.as_str())
    }
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(subjects: &[Subject]) -> Vec<&str> {
        subjects.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_first_class_subjects_in_declared_order() {
        let catalog = SubjectCatalog::builtin();
        assert_eq!(
            names(catalog.subjects_for("First")),
            vec!["Urdu", "English", "Mathematics"]
        );
    }

    #[test]
    fn test_unknown_class_is_empty() {
        let catalog = SubjectCatalog::builtin();
        assert!(catalog.subjects_for("Unknown").is_empty());
        assert!(catalog.subjects_for("first").is_empty());
        assert!(!catalog.contains("Unknown"));
    }

    #[test]
    fn test_subject_key_derivation() {
        assert_eq!(subject_key("Mathematics"), "mathematics");
        assert_eq!(subject_key("General Knowledge"), "generalknowledge");
        assert_eq!(subject_key("Social-Studies 2"), "socialstudies2");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{"classes":[{"name":"Sixth","subjects":["Physics","Social Studies"]}]}"#;
        let catalog = SubjectCatalog::from_json_str(json).unwrap();
        let subjects = catalog.subjects_for("Sixth");
        assert_eq!(names(subjects), vec!["Physics", "Social Studies"]);
        assert_eq!(subjects[1].key, "socialstudies");
        assert_eq!(catalog.class_names().collect::<Vec<_>>(), vec!["Sixth"]);
    }

    #[test]
    fn test_from_json_str_rejects_duplicates() {
        let json = r#"{"classes":[{"name":"A","subjects":[]},{"name":"A","subjects":["X"]}]}"#;
        let err = SubjectCatalog::from_json_str(json).unwrap_err();
        assert!(err.contains("duplicate class"));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = SubjectCatalog::from_json_file(Path::new("/nonexistent/catalog.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Catalog { .. }));
    }
}
