use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use common::error::AppError;

use crate::utils::file_text_extraction::extract_documents;

/// A unit of loaded text: a whole text file, or one page of a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub source: String,
    pub page: Option<u32>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    /// Only `.txt` and `.pdf` files are ingested, whatever the letter case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension != "txt" && extension != "pdf" {
            return None;
        }

        match mime_guess::from_ext(&extension).first_raw()? {
            "text/plain" => Some(Self::Text),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Collects every ingestible file under `dir`, sorted by path.
pub async fn discover_files(dir: &Path) -> Result<Vec<(PathBuf, DocumentKind)>, AppError> {
    match tokio::fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(AppError::Validation(format!(
                "{} is not a directory",
                dir.display()
            )))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "documents directory {} does not exist",
                dir.display()
            )))
        }
        Err(err) => return Err(err.into()),
    }

    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if let Some(kind) = DocumentKind::from_path(&path) {
                files.push((path, kind));
            } else {
                debug!(path = %path.display(), "skipping unsupported file");
            }
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Loads all `.txt` and `.pdf` files under `dir` as documents, ordered by source then page.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>, AppError> {
    let files = discover_files(dir).await?;

    let mut documents = Vec::new();
    for (path, kind) in &files {
        let loaded = extract_documents(path, *kind).await?;
        debug!(path = %path.display(), documents = loaded.len(), "loaded file");
        documents.extend(loaded);
    }

    documents.sort_by(|a, b| a.source.cmp(&b.source).then(a.page.cmp(&b.page)));
    info!(
        files = files.len(),
        documents = documents.len(),
        "loaded documents"
    );

    Ok(documents)
}
