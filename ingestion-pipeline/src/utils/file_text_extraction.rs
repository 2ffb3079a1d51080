use std::path::Path;

use common::error::AppError;

use super::pdf_ingestion::extract_pdf_sections;
use crate::loader::{Document, DocumentKind};

/// Reads one file into documents: a text file becomes one document, a PDF one per page.
pub async fn extract_documents(path: &Path, kind: DocumentKind) -> Result<Vec<Document>, AppError> {
    let source = path.display().to_string();

    match kind {
        DocumentKind::Text => {
            let content = tokio::fs::read_to_string(path).await?;
            if content.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![Document {
                source,
                page: None,
                content,
            }])
        }
        DocumentKind::Pdf => Ok(extract_pdf_sections(path)
            .await?
            .into_iter()
            .map(|section| Document {
                source: source.clone(),
                page: section.page,
                content: section.text,
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_file_becomes_single_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "Tokio is an async runtime.")
            .await
            .expect("write");

        let documents = extract_documents(&path, DocumentKind::Text)
            .await
            .expect("extract");

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "Tokio is an async runtime.");
        assert_eq!(documents[0].page, None);
        assert!(documents[0].source.ends_with("notes.txt"));
    }

    #[tokio::test]
    async fn blank_text_file_yields_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.txt");
        tokio::fs::write(&path, "  \n\t").await.expect("write");

        let documents = extract_documents(&path, DocumentKind::Text)
            .await
            .expect("extract");
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("latin1.txt");
        tokio::fs::write(&path, [0xff, 0xfe, 0x41]).await.expect("write");

        let result = extract_documents(&path, DocumentKind::Text).await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
