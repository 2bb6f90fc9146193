use lopdf::Document;
use tracing::{debug, warn};

use crate::IngestError;

/// Text of every page, one page per line.
///
/// Documents longer than `max_pages` are rejected before any text is read.
/// Pages whose content cannot be decoded are skipped.
pub fn pdf_text(bytes: &[u8], max_pages: usize) -> Result<String, IngestError> {
    let doc = Document::load_mem(bytes).map_err(|e| IngestError::Pdf(e.to_string()))?;
    let pages = doc.get_pages();
    if pages.len() > max_pages {
        return Err(IngestError::TooManyPages {
            pages: pages.len(),
            max: max_pages,
        });
    }

    let mut text = String::new();
    for &number in pages.keys() {
        match doc.extract_text(&[number]) {
            Ok(page) => {
                debug!(page = number, chars = page.len(), "extracted pdf page");
                text.push_str(&page);
                text.push('\n');
            }
            Err(e) => warn!(page = number, error = %e, "skipping unreadable pdf page"),
        }
    }
    Ok(text)
}

/// Paragraph and table text of a DOCX body, one block per line.
pub fn docx_text(bytes: &[u8]) -> Result<String, IngestError> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| IngestError::Docx(e.to_string()))?;
    let mut text = String::new();
    for child in &doc.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(p) => {
                push_paragraph(p, &mut text);
                text.push('\n');
            }
            docx_rs::DocumentChild::Table(table) => {
                push_table(table, &mut text);
            }
            _ => {}
        }
    }
    Ok(text)
}

fn push_paragraph(p: &docx_rs::Paragraph, text: &mut String) {
    for child in &p.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run(run, text),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = inner {
                        push_run(run, text);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &docx_rs::Run, text: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(t) => text.push_str(&t.text),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            docx_rs::RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn push_table(table: &docx_rs::Table, text: &mut String) {
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(tr) = row;
        for cell in &tr.cells {
            let docx_rs::TableRowChild::TableCell(tc) = cell;
            for content in &tc.children {
                if let docx_rs::TableCellContent::Paragraph(p) = content {
                    push_paragraph(p, text);
                    text.push(' ');
                }
            }
        }
        text.push('\n');
    }
}
