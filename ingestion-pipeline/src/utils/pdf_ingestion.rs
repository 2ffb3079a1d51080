use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use common::error::AppError;

/// Text pulled from a PDF. `page` is `None` when only whole-document extraction worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfSection {
    pub page: Option<u32>,
    pub text: String,
}

/// Extracts the PDF page by page with `lopdf`, falling back to a single
/// `pdf-extract` pass over the whole file when no page yields text.
pub async fn extract_pdf_sections(file_path: &Path) -> Result<Vec<PdfSection>, AppError> {
    let pdf_bytes = tokio::fs::read(file_path).await?;

    let per_page = {
        let bytes = pdf_bytes.clone();
        tokio::task::spawn_blocking(move || extract_pages(&bytes)).await?
    };

    match per_page {
        Ok(sections) if !sections.is_empty() => return Ok(sections),
        Ok(_) => debug!(path = %file_path.display(), "no per-page text; using whole-document extraction"),
        Err(err) => warn!(
            path = %file_path.display(),
            error = %err,
            "per-page PDF extraction failed; using whole-document extraction"
        ),
    }

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&pdf_bytes).map(|text| normalize_text(&text))
    })
    .await?
    .map_err(|err| AppError::Processing(format!("Failed to extract text from PDF: {err}")))?;

    if text.is_empty() {
        warn!(path = %file_path.display(), "PDF has no extractable text");
        return Ok(Vec::new());
    }

    Ok(vec![PdfSection { page: None, text }])
}

/// Runs on a blocking thread; `lopdf` parsing is CPU bound.
fn extract_pages(pdf_bytes: &[u8]) -> Result<Vec<PdfSection>, AppError> {
    let document = Document::load_mem(pdf_bytes)
        .map_err(|err| AppError::Processing(format!("Failed to parse PDF: {err}")))?;

    let mut page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let mut sections = Vec::with_capacity(page_numbers.len());
    for page in page_numbers {
        match document.extract_text(&[page]) {
            Ok(raw) => {
                let text = normalize_text(&raw);
                if !text.is_empty() {
                    sections.push(PdfSection {
                        page: Some(page),
                        text,
                    });
                }
            }
            Err(err) => debug!(page, error = %err, "skipping unreadable PDF page"),
        }
    }

    Ok(sections)
}

fn normalize_text(raw: &str) -> String {
    raw.replace('\0', "")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
