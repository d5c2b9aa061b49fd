//! HTML for `GET /`.

use super::catalog::SubjectCatalog;
use super::models::{
    ASSESSMENT_TITLE_FIELD, CLASS_NAME_FIELD, DATE_SUFFIX, DAY_SUFFIX, PORTION_SUFFIX,
};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem auto; max-width: 56rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem; text-align: left; }}
textarea {{ width: 100%; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

/// Class picker shown when no class is selected.
pub fn render_class_picker(catalog: &SubjectCatalog) -> String {
    let options: String = catalog
        .class_names()
        .map(|name| {
            let name = escape_html(name);
            format!("<option value=\"{name}\">{name}</option>\n")
        })
        .collect();

    let body = format!(
        r#"<form method="get" action="/">
<label for="class">Class</label>
<select id="class" name="class">
{options}</select>
<button type="submit">Continue</button>
</form>"#
    );
    page("Date Sheet Generator", &body)
}

/// Entry form for one class: date, day and portion for each of its subjects.
pub fn render_subject_form(catalog: &SubjectCatalog, class_name: &str) -> String {
    let subjects = catalog.subjects_for(class_name);
    let class = escape_html(class_name);

    let day_options: String = std::iter::once("<option value=\"\"></option>".to_string())
        .chain(WEEKDAYS.iter().map(|d| format!("<option>{d}</option>")))
        .collect();

    let rows: String = subjects
        .iter()
        .map(|subject| {
            let key = escape_html(&subject.key);
            format!(
                r#"<tr>
<td>{name}</td>
<td><input type="date" name="{key}{DATE_SUFFIX}"></td>
<td><select name="{key}{DAY_SUFFIX}">{day_options}</select></td>
<td><textarea name="{key}{PORTION_SUFFIX}" rows="3"></textarea></td>
</tr>
"#,
                name = escape_html(&subject.name),
            )
        })
        .collect();

    let table = if subjects.is_empty() {
        "<p>No subjects are configured for this class.</p>".to_string()
    } else {
        format!(
            "<table>\n<tr><th>Subject</th><th>Date</th><th>Day</th><th>Syllabus</th></tr>\n{rows}</table>"
        )
    };

    let body = format!(
        r#"<form method="post" action="/" enctype="multipart/form-data">
<input type="hidden" name="{CLASS_NAME_FIELD}" value="{class}">
<p><label>Assessment <input type="text" name="{ASSESSMENT_TITLE_FIELD}" required></label></p>
{table}
<p><button type="submit">Generate</button> <a href="/">Change class</a></p>
</form>"#
    );
    page(&format!("Date Sheet: {}", class_name), &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_class_picker_lists_classes() {
        let html = render_class_picker(&SubjectCatalog::builtin());
        assert!(html.contains("<option value=\"First\">First</option>"));
        assert!(html.contains("<option value=\"Playgroup\">Playgroup</option>"));
    }

    #[test]
    fn test_subject_form_has_fields_per_subject() {
        let html = render_subject_form(&SubjectCatalog::builtin(), "First");
        assert!(html.contains(r#"name="className" value="First""#));
        assert!(html.contains(r#"name="urduDate""#));
        assert!(html.contains(r#"name="englishDay""#));
        assert!(html.contains(r#"name="mathematicsSyllabus""#));
    }

    #[test]
    fn test_subject_form_for_unknown_class() {
        let html = render_subject_form(&SubjectCatalog::builtin(), "<b>Tenth</b>");
        assert!(html.contains("No subjects are configured"));
        assert!(html.contains("&lt;b&gt;Tenth&lt;/b&gt;"));
        assert!(!html.contains("<b>Tenth</b>"));
    }
}
