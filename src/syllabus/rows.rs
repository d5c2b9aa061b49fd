//! Builds the syllabus table rows from submitted per-subject fields.
//!
//! Two date parsers are involved. A permissive one derives the weekday and
//! the month/year heading, a strict `YYYY-MM-DD` one orders the rows. A date
//! the permissive parser accepts but the strict one rejects (e.g. `2024-3-1`)
//! still fails the sort.

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use super::catalog::Subject;
use super::models::{MonthYearLabel, SubjectFields, SyllabusRow};

lazy_static! {
    static ref STRICT_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

const STRICT_FORMAT: &str = "%Y-%m-%d";

const PERMISSIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%A, %d %B %Y",
    "%A %d %B %Y",
];

const PERMISSIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyllabusError {
    #[error("date '{value}' for {subject} is not in YYYY-MM-DD form")]
    UnparseableDate { subject: String, value: String },
}

/// Parse a date the way a lenient human-oriented parser would.
pub fn parse_date_permissive(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    PERMISSIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            PERMISSIVE_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Parse a date that must be exactly `YYYY-MM-DD`.
pub fn parse_date_strict(raw: &str) -> Option<NaiveDate> {
    if !STRICT_DATE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, STRICT_FORMAT).ok()
}

/// One row per subject, in catalog order.
///
/// The weekday is derived from the date when it parses; otherwise the
/// submitted day is kept. The date is always the submitted text.
pub fn build_rows(
    subjects: &[Subject],
    fields: &HashMap<String, SubjectFields>,
) -> Vec<SyllabusRow> {
    let empty = SubjectFields::default();

    subjects
        .iter()
        .map(|subject| {
            let submitted = fields.get(&subject.key).unwrap_or(&empty);
            let day = match parse_date_permissive(&submitted.date) {
                Some(date) => date.format("%A").to_string(),
                None => submitted.day.clone(),
            };

            SyllabusRow {
                date: submitted.date.clone(),
                day,
                subject: subject.name.clone(),
                portion: submitted.portion.clone(),
            }
        })
        .collect()
}

/// Order rows by date, ascending. Every row must carry a strict
/// `YYYY-MM-DD` date or the whole sort fails. Equal dates keep their order.
pub fn sort_rows(rows: Vec<SyllabusRow>) -> Result<Vec<SyllabusRow>, SyllabusError> {
    let mut keyed = rows
        .into_iter()
        .map(|row| match parse_date_strict(&row.date) {
            Some(date) => Ok((date, row)),
            None => Err(SyllabusError::UnparseableDate {
                subject: row.subject.clone(),
                value: row.date.clone(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by_key(|(date, _)| *date);
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Month and year of the latest parseable date, or the `Month`/`Year` placeholders.
pub fn month_year_label(rows: &[SyllabusRow]) -> MonthYearLabel {
    rows.iter()
        .filter_map(|row| parse_date_permissive(&row.date))
        .max()
        .map(|latest| MonthYearLabel {
            month: latest.format("%B").to_string(),
            year: latest.format("%Y").to_string(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syllabus::catalog::SubjectCatalog;

    fn fields(entries: &[(&str, &str, &str, &str)]) -> HashMap<String, SubjectFields> {
        entries
            .iter()
            .map(|(key, date, day, portion)| {
                (
                    key.to_string(),
                    SubjectFields {
                        date: date.to_string(),
                        day: day.to_string(),
                        portion: portion.to_string(),
                    },
                )
            })
            .collect()
    }

    fn subjects(rows: &[SyllabusRow]) -> Vec<&str> {
        rows.iter().map(|r| r.subject.as_str()).collect()
    }

    #[test]
    fn test_first_class_rows_sorted_by_date() {
        let catalog = SubjectCatalog::builtin();
        let submitted = fields(&[
            ("urdu", "2024-03-01", "", "Lesson 1-4"),
            ("english", "2024-03-03", "", "Unit 2"),
            ("mathematics", "2024-03-02", "", "Chapter 5"),
        ]);

        let rows = build_rows(catalog.subjects_for("First"), &submitted);
        assert_eq!(subjects(&rows), vec!["Urdu", "English", "Mathematics"]);

        let label = month_year_label(&rows);
        let sorted = sort_rows(rows).unwrap();

        assert_eq!(subjects(&sorted), vec!["Urdu", "Mathematics", "English"]);
        assert_eq!(sorted[0].day, "Friday");
        assert_eq!(sorted[1].day, "Saturday");
        assert_eq!(sorted[2].day, "Sunday");
        assert_eq!(label.month, "March");
        assert_eq!(label.year, "2024");
    }

    #[test]
    fn test_unknown_class_produces_no_rows() {
        let catalog = SubjectCatalog::builtin();
        let submitted = fields(&[("urdu", "2024-03-01", "", "")]);

        let rows = build_rows(catalog.subjects_for("Unknown"), &submitted);
        assert!(rows.is_empty());
        assert_eq!(month_year_label(&rows), MonthYearLabel::default());
        assert!(sort_rows(rows).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_date_keeps_submitted_day() {
        let subject_list = vec![Subject::new("Urdu")];
        let submitted = fields(&[("urdu", "not-a-date", "Monday", "Poem")]);

        let rows = build_rows(&subject_list, &submitted);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "not-a-date");
        assert_eq!(rows[0].day, "Monday");
        assert_eq!(rows[0].portion, "Poem");

        let err = sort_rows(rows).unwrap_err();
        assert_eq!(
            err,
            SyllabusError::UnparseableDate {
                subject: "Urdu".to_string(),
                value: "not-a-date".to_string(),
            }
        );
    }

    #[test]
    fn test_permissive_date_fails_strict_sort() {
        let subject_list = vec![Subject::new("Urdu"), Subject::new("English")];
        let submitted = fields(&[
            ("urdu", "2024-3-1", "", ""),
            ("english", "2024-03-04", "", ""),
        ]);

        let rows = build_rows(&subject_list, &submitted);
        assert_eq!(rows[0].day, "Friday");
        assert_eq!(rows[0].date, "2024-3-1");
        assert!(matches!(
            sort_rows(rows),
            Err(SyllabusError::UnparseableDate { ref subject, .. }) if subject == "Urdu"
        ));
    }

    #[test]
    fn test_padded_date_is_kept_verbatim_and_fails_strict_sort() {
        let subject_list = vec![Subject::new("Urdu")];
        let submitted = fields(&[("urdu", " 2024-03-01 ", "", "  1. Poem\n  2. Story")]);

        let rows = build_rows(&subject_list, &submitted);
        assert_eq!(rows[0].date, " 2024-03-01 ");
        assert_eq!(rows[0].day, "Friday");
        assert_eq!(rows[0].portion, "  1. Poem\n  2. Story");
        assert_eq!(month_year_label(&rows).month, "March");
        assert_eq!(
            sort_rows(rows).unwrap_err(),
            SyllabusError::UnparseableDate {
                subject: "Urdu".to_string(),
                value: " 2024-03-01 ".to_string(),
            }
        );
    }

    #[test]
    fn test_every_builtin_class_yields_catalog_rows_in_order() {
        let catalog = SubjectCatalog::builtin();
        let mut classes = 0;
        for class in catalog.class_names() {
            let expected: Vec<&str> = catalog
                .subjects_for(class)
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            let submitted: HashMap<String, SubjectFields> = catalog
                .subjects_for(class)
                .iter()
                .map(|s| (s.key.clone(), SubjectFields::default()))
                .collect();

            let rows = build_rows(catalog.subjects_for(class), &submitted);
            assert!(!expected.is_empty(), "{class} has no subjects");
            assert_eq!(rows.len(), expected.len(), "row count for {class}");
            assert_eq!(subjects(&rows), expected, "subject order for {class}");
            classes += 1;
        }
        assert_eq!(classes, 8);
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let subject_list = vec![Subject::new("Science")];
        let rows = build_rows(&subject_list, &HashMap::new());
        assert_eq!(
            rows[0],
            SyllabusRow {
                date: String::new(),
                day: String::new(),
                subject: "Science".to_string(),
                portion: String::new(),
            }
        );
        assert!(sort_rows(rows).is_err());
    }

    #[test]
    fn test_equal_dates_keep_catalog_order() {
        let subject_list = vec![
            Subject::new("Urdu"),
            Subject::new("English"),
            Subject::new("Science"),
        ];
        let submitted = fields(&[
            ("urdu", "2024-05-02", "", ""),
            ("english", "2024-05-01", "", ""),
            ("science", "2024-05-01", "", ""),
        ]);

        let sorted = sort_rows(build_rows(&subject_list, &submitted)).unwrap();
        assert_eq!(subjects(&sorted), vec!["English", "Science", "Urdu"]);
    }

    #[test]
    fn test_sorted_output_is_non_decreasing() {
        let subject_list: Vec<Subject> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| Subject::new(s))
            .collect();
        let submitted = fields(&[
            ("a", "2024-12-01", "", ""),
            ("b", "2023-01-15", "", ""),
            ("c", "2024-02-29", "", ""),
            ("d", "2024-02-28", "", ""),
            ("e", "2023-12-31", "", ""),
        ]);

        let sorted = sort_rows(build_rows(&subject_list, &submitted)).unwrap();
        let dates: Vec<NaiveDate> = sorted
            .iter()
            .map(|r| parse_date_strict(&r.date).unwrap())
            .collect();
        assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_label_uses_latest_date() {
        let subject_list = vec![Subject::new("Urdu"), Subject::new("English")];
        let submitted = fields(&[
            ("urdu", "2024-12-30", "", ""),
            ("english", "5 January 2025", "", ""),
        ]);

        let label = month_year_label(&build_rows(&subject_list, &submitted));
        assert_eq!(label.month, "January");
        assert_eq!(label.year, "2025");
    }

    #[test]
    fn test_parse_date_permissive_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for raw in [
            "2024-03-01",
            "2024-3-1",
            "2024/03/01",
            "03/01/2024",
            "1 March 2024",
            "1 Mar 2024",
            "March 1, 2024",
            "Mar 1 2024",
            "2024-03-01T09:30",
            "  2024-03-01  ",
        ] {
            assert_eq!(parse_date_permissive(raw), Some(expected), "input {raw:?}");
        }

        // Day-first fallback when the month-first reading is impossible.
        assert_eq!(
            parse_date_permissive("25/03/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 25)
        );
        assert_eq!(parse_date_permissive(""), None);
        assert_eq!(parse_date_permissive("tomorrow"), None);
    }

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date_strict("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date_strict("2024-3-1"), None);
        assert_eq!(parse_date_strict("2024-02-30"), None);
        assert_eq!(parse_date_strict(" 2024-03-01"), None);
    }
}
