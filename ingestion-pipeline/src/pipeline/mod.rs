mod config;


pub use config::IngestionConfig;

use std::{path::Path, sync::Arc, time::Instant};

use serde::Serialize;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, info, warn};

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{index_settings::IndexSettings, text_chunk::TextChunk},
        vector_index::VectorIndex,
    },
    utils::embedding::{is_zero_vector, Embedder},
};

use crate::{
    chunking::Chunker,
    loader::{load_documents, Document},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub files: usize,
    pub documents: usize,
    pub chunks: usize,
}

pub struct IngestionPipeline {
    db: Arc<SurrealDbClient>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: IngestionConfig,
}

impl IngestionPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            db,
            chunker,
            embedder,
            index,
            config,
        }
    }

    /// Loads, splits, embeds and stores every document under `dir`.
    #[tracing::instrument(skip_all, fields(dir = %dir.display(), append = self.config.append))]
    pub async fn run(&self, dir: &Path) -> Result<IngestionReport, AppError> {
        let started = Instant::now();

        let documents = load_documents(dir).await?;
        IndexSettings::sync_for_ingestion(&self.db, self.embedder.as_ref(), self.config.reset)
            .await?;

        if documents.is_empty() {
            warn!("no .txt or .pdf documents found; nothing to ingest");
            return Ok(IngestionReport::default());
        }

        let mut report = IngestionReport {
            documents: documents.len(),
            ..IngestionReport::default()
        };

        for group in documents.chunk_by(|a, b| a.source == b.source) {
            report.files += 1;
            report.chunks += self.ingest_source(group).await?;
        }

        info!(
            files = report.files,
            documents = report.documents,
            chunks = report.chunks,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "ingestion finished"
        );

        Ok(report)
    }

    /// Replaces the stored chunks of one source with freshly embedded ones.
    ///
    /// Every chunk is embedded before anything is deleted, so a failed run
    /// leaves the previously stored chunks in place.
    async fn ingest_source(&self, documents: &[Document]) -> Result<usize, AppError> {
        let Some(source) = documents.first().map(|doc| doc.source.as_str()) else {
            return Ok(0);
        };

        let mut pending: Vec<(Option<u32>, String)> = Vec::new();
        for document in documents {
            for chunk in self.chunker.split(&document.content)? {
                pending.push((document.page, chunk));
            }
        }

        let mut records = Vec::with_capacity(pending.len());
        let mut chunk_index: u32 = 0;
        let mut skipped = 0usize;
        for batch in pending.chunks(self.config.embedding_batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let embeddings = self.embed_with_retry(texts).await?;

            for ((page, text), embedding) in batch.iter().zip(embeddings) {
                // No direction to compare against; cosine distance would be NaN
                if is_zero_vector(&embedding) {
                    skipped += 1;
                    continue;
                }
                records.push(TextChunk::new(
                    source.to_owned(),
                    *page,
                    chunk_index,
                    text.clone(),
                    embedding,
                ));
                chunk_index = chunk_index.saturating_add(1);
            }
        }

        if skipped > 0 {
            warn!(%source, skipped, "skipped chunks with an all-zero embedding");
        }

        if !self.config.append {
            self.index.delete_source(source).await?;
        }
        let stored = if records.is_empty() {
            0
        } else {
            self.index.insert(records).await?
        };

        debug!(%source, documents = documents.len(), chunks = stored, "ingested source");
        Ok(stored)
    }

    async fn embed_with_retry(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        let expected = texts.len();
        let retry_strategy = ExponentialBackoff::from_millis(self.config.embedding_retry_base_ms)
            .map(jitter)
            .take(self.config.embedding_attempts.saturating_sub(1));

        let embeddings = Retry::spawn(retry_strategy, || {
            let embedder = Arc::clone(&self.embedder);
            let texts = texts.clone();
            async move { embedder.embed_batch(texts).await }
        })
        .await
        .map_err(AppError::Embedding)?;

        if embeddings.len() != expected {
            return Err(AppError::Processing(format!(
                "embedder returned {} vectors for {expected} chunks",
                embeddings.len()
            )));
        }

        let dimension = self.embedder.dimension();
        if let Some(bad) = embeddings.iter().find(|vector| vector.len() != dimension) {
            return Err(AppError::Processing(format!(
                "embedder returned a {} dimensional vector, expected {dimension}",
                bad.len()
            )));
        }

        Ok(embeddings)
    }
}
