use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{text_chunk::TextChunk, StoredObject},
    },
};

/// A chunk returned by a similarity query. `score` is cosine similarity, higher is closer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub source: String,
    pub page: Option<u32>,
    pub chunk_index: u32,
    pub text: String,
    pub score: f32,
}

/// Nearest-neighbour store for embedded chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persists the chunks and returns how many were written.
    async fn insert(&self, chunks: Vec<TextChunk>) -> Result<usize, AppError>;

    /// Returns up to `top_k` chunks ranked by similarity to `embedding`.
    async fn query(&self, embedding: &[f32], top_k: usize)
        -> Result<Vec<RetrievedChunk>, AppError>;

    /// Drops every chunk that was cut from `source`.
    async fn delete_source(&self, source: &str) -> Result<(), AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}

#[derive(Clone)]
pub struct SurrealVectorIndex {
    db: Arc<SurrealDbClient>,
}

impl SurrealVectorIndex {
    pub fn new(db: Arc<SurrealDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VectorIndex for SurrealVectorIndex {
    async fn insert(&self, chunks: Vec<TextChunk>) -> Result<usize, AppError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let stored: Vec<TextChunk> = self
            .db
            .client
            .insert(TextChunk::table_name())
            .content(chunks)
            .await?;
        debug!(count = stored.len(), "stored text chunks");

        Ok(stored.len())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let rows = TextChunk::search_nearest(embedding.to_vec(), top_k, &self.db).await?;

        Ok(rows
            .into_iter()
            .map(|row| RetrievedChunk {
                id: row.id,
                source: row.source,
                page: row.page,
                chunk_index: row.chunk_index,
                text: row.chunk,
                score: 1.0 - row.distance,
            })
            .collect())
    }

    async fn delete_source(&self, source: &str) -> Result<(), AppError> {
        TextChunk::delete_by_source(source, &self.db).await
    }

    async fn count(&self) -> Result<usize, AppError> {
        TextChunk::count(&self.db).await
    }
}
