//! Fills the syllabus template: placeholder tokens in text runs and the
//! syllabus table.

use super::docx::DocxPackage;
use super::xml::{XmlElement, XmlNode};
use super::DocumentError;
use crate::syllabus::models::SyllabusRow;

pub const HEADER_ROWS: usize = 1;
pub const COLUMN_COUNT: usize = 4;
/// Column holding the syllabus portion; left aligned and not bold.
pub const PORTION_COLUMN: usize = 3;

/// `w:pPr` children that must come after `w:jc`.
const AFTER_JC: &[&str] = &[
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Per-column formatting of filled cells.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CellStyle {
    font: Option<String>,
    bold: bool,
    alignment: &'static str,
}

/// Applies syllabus data to a template document.
#[derive(Debug, Clone)]
pub struct TemplateFiller {
    /// Font size in half points, as WordprocessingML stores it.
    font_size_half_points: u32,
}

impl TemplateFiller {
    pub fn new(font_size_pt: u32) -> Self {
        Self {
            font_size_half_points: font_size_pt.saturating_mul(2),
        }
    }

    /// Replace every token found inside a single run's text.
    ///
    /// Adjacent `w:t` elements are matched as one string; other run content
    /// such as `w:tab` or `w:br` stays in place and ends the span. A token
    /// broken across runs (e.g. by a spell-check or formatting boundary) is
    /// not matched. Returns the number of runs changed.
    pub fn replace_placeholders(
        &self,
        docx: &mut DocxPackage,
        replacements: &[(&str, &str)],
    ) -> Result<usize, DocumentError> {
        let body = docx.body_mut()?;
        let mut changed = 0;

        body.visit_mut("w:r", &mut |run: &mut XmlElement| {
            let mut run_changed = false;
            for span in text_spans(run) {
                let original: String = span.iter().map(|&i| node_text(&run.children[i])).collect();
                let mut replaced = original.clone();
                for (token, value) in replacements {
                    if replaced.contains(token) {
                        replaced = replaced.replace(token, value);
                    }
                }
                if replaced == original {
                    continue;
                }

                for (n, &i) in span.iter().enumerate() {
                    if let XmlNode::Element(text) = &mut run.children[i] {
                        if n == 0 {
                            text.set_text(&replaced);
                            text.set_attr("xml:space", "preserve");
                        } else {
                            text.set_text("");
                        }
                    }
                }
                run_changed = true;
            }
            if run_changed {
                changed += 1;
            }
        });

        Ok(changed)
    }

    /// Write rows into the first table, below its header row, growing the
    /// table when needed. The header row is only read.
    pub fn fill_table(
        &self,
        docx: &mut DocxPackage,
        rows: &[SyllabusRow],
    ) -> Result<(), DocumentError> {
        let table = docx
            .body_mut()?
            .find_mut("w:tbl")
            .ok_or(DocumentError::MissingTable)?;

        if rows.is_empty() {
            return Ok(());
        }

        let header = table
            .child("w:tr")
            .ok_or(DocumentError::TooFewCells {
                row: 0,
                found: 0,
                expected: COLUMN_COUNT,
            })?;
        let styles = column_styles(header)?;
        let blank_row = blank_row_like(header);

        let required = HEADER_ROWS + rows.len();
        let existing = table.children_named("w:tr").count();
        for _ in existing..required {
            push_row(table, blank_row.clone());
        }

        for (index, (tr, row)) in table
            .children_named_mut("w:tr")
            .skip(HEADER_ROWS)
            .zip(rows)
            .enumerate()
        {
            let row_index = HEADER_ROWS + index;
            let cell_count = tr.children_named("w:tc").count();
            if cell_count < COLUMN_COUNT {
                return Err(DocumentError::TooFewCells {
                    row: row_index,
                    found: cell_count,
                    expected: COLUMN_COUNT,
                });
            }

            for ((cell, value), style) in tr.children_named_mut("w:tc").zip(row.cells()).zip(&styles) {
                write_cell(cell, value, style, self.font_size_half_points);
            }
        }

        Ok(())
    }
}

/// Append a `w:tr` after the last existing row of a table.
fn push_row(table: &mut XmlElement, row: XmlElement) {
    let position = table
        .children
        .iter()
        .rposition(|node| matches!(node, XmlNode::Element(el) if el.is("w:tr")))
        .map(|i| i + 1)
        .unwrap_or(table.children.len());
    table.children.insert(position, XmlNode::Element(row));
}

fn column_styles(header: &XmlElement) -> Result<Vec<CellStyle>, DocumentError> {
    let cells: Vec<&XmlElement> = header.children_named("w:tc").collect();
    if cells.len() < COLUMN_COUNT {
        return Err(DocumentError::TooFewCells {
            row: 0,
            found: cells.len(),
            expected: COLUMN_COUNT,
        });
    }

    cells
        .into_iter()
        .take(COLUMN_COUNT)
        .enumerate()
        .map(|(column, cell)| {
            let run = cell
                .child("w:p")
                .and_then(|p| p.find("w:r"))
                .ok_or(DocumentError::HeaderCellWithoutRuns { column })?;
            let font = run
                .child("w:rPr")
                .and_then(|rpr| rpr.child("w:rFonts"))
                .and_then(|fonts| fonts.attr("w:ascii").or_else(|| fonts.attr("w:hAnsi")));

            let portion = column == PORTION_COLUMN;
            Ok(CellStyle {
                font,
                bold: !portion,
                alignment: if portion { "left" } else { "center" },
            })
        })
        .collect()
}

/// A new table row with one empty cell per header cell, keeping cell widths.
fn blank_row_like(header: &XmlElement) -> XmlElement {
    header
        .children_named("w:tc")
        .fold(XmlElement::new("w:tr"), |row, header_cell| {
            let mut cell = XmlElement::new("w:tc");
            if let Some(tc_pr) = header_cell.child("w:tcPr") {
                cell = cell.with_child(tc_pr.clone());
            }
            row.with_child(cell.with_child(XmlElement::new("w:p")))
        })
}

fn write_cell(cell: &mut XmlElement, value: &str, style: &CellStyle, size: u32) {
    // Keep only the first paragraph, emptied of runs.
    let mut seen_paragraph = false;
    cell.children.retain(|node| match node {
        XmlNode::Element(el) if el.is("w:p") => !std::mem::replace(&mut seen_paragraph, true),
        _ => true,
    });
    if !seen_paragraph {
        cell.children.push(XmlNode::Element(XmlElement::new("w:p")));
    }

    let Some(paragraph) = cell.child_mut("w:p") else {
        return;
    };
    paragraph
        .children
        .retain(|node| matches!(node, XmlNode::Element(el) if el.is("w:pPr")));

    if paragraph.child("w:pPr").is_none() {
        paragraph
            .children
            .insert(0, XmlNode::Element(XmlElement::new("w:pPr")));
    }
    if let Some(ppr) = paragraph.child_mut("w:pPr") {
        set_alignment(ppr, style.alignment);
    }

    paragraph
        .children
        .push(XmlNode::Element(styled_run(value, style, size)));
}

fn set_alignment(ppr: &mut XmlElement, alignment: &str) {
    ppr.remove_children("w:jc");
    let jc = XmlElement::new("w:jc").with_attr("w:val", alignment);
    let position = ppr
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(el) if AFTER_JC.iter().any(|n| el.is(n))))
        .unwrap_or(ppr.children.len());
    ppr.children.insert(position, XmlNode::Element(jc));
}

fn styled_run(value: &str, style: &CellStyle, size: u32) -> XmlElement {
    let size = size.to_string();
    let mut rpr = XmlElement::new("w:rPr");
    if let Some(font) = &style.font {
        rpr = rpr.with_child(
            XmlElement::new("w:rFonts")
                .with_attr("w:ascii", font)
                .with_attr("w:hAnsi", font)
                .with_attr("w:cs", font),
        );
    }
    rpr = if style.bold {
        rpr.with_child(XmlElement::new("w:b"))
    } else {
        rpr.with_child(XmlElement::new("w:b").with_attr("w:val", "0"))
    };
    rpr = rpr
        .with_child(XmlElement::new("w:sz").with_attr("w:val", &size))
        .with_child(XmlElement::new("w:szCs").with_attr("w:val", &size));

    let mut run = XmlElement::new("w:r").with_child(rpr);
    let normalized = value.replace("\r\n", "\n");
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            run = run.with_child(XmlElement::new("w:br"));
        }
        run = run.with_child(
            XmlElement::new("w:t")
                .with_attr("xml:space", "preserve")
                .with_text(line),
        );
    }
    run
}

/// Indices of consecutive `w:t` children of a run, one group per unbroken
/// stretch of text.
fn text_spans(run: &XmlElement) -> Vec<Vec<usize>> {
    let mut spans = Vec::new();
    let mut current = Vec::new();
    for (i, node) in run.children.iter().enumerate() {
        match node {
            XmlNode::Element(el) if el.is("w:t") => current.push(i),
            XmlNode::Element(_) => {
                if !current.is_empty() {
                    spans.push(std::mem::take(&mut current));
                }
            }
            XmlNode::Text(_) | XmlNode::Other(_) => {}
        }
    }
    if !current.is_empty() {
        spans.push(current);
    }
    spans
}

fn node_text(node: &XmlNode) -> String {
    match node {
        XmlNode::Element(el) => el.text(),
        _ => String::new(),
    }
}
