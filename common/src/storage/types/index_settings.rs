use tracing::{info, warn};

use crate::{
    error::AppError,
    storage::{db::SurrealDbClient, indexes},
    stored_object,
    utils::embedding::Embedder,
};

const CURRENT_ID: &str = "current";

stored_object!(IndexSettings, "index_settings", {
    embedding_backend: String,
    embedding_model: Option<String>,
    embedding_dimension: usize
});

impl IndexSettings {
    pub fn from_embedder(embedder: &dyn Embedder) -> Self {
        let now = Utc::now();
        Self {
            id: CURRENT_ID.to_string(),
            created_at: now,
            updated_at: now,
            embedding_backend: embedder.backend_label().to_string(),
            embedding_model: embedder.model_code(),
            embedding_dimension: embedder.dimension(),
        }
    }

    pub async fn get_current(db: &SurrealDbClient) -> Result<Option<Self>, AppError> {
        Ok(db.get_item::<Self>(CURRENT_ID).await?)
    }

    /// Describes why vectors from `other` cannot share an index with these settings.
    fn incompatibility(&self, other: &Self) -> Option<String> {
        if self.embedding_dimension != other.embedding_dimension {
            return Some(format!(
                "vector store holds {} dimensional embeddings but the embedder produces {}",
                self.embedding_dimension, other.embedding_dimension
            ));
        }
        if self.embedding_backend != other.embedding_backend
            || self.embedding_model != other.embedding_model
        {
            return Some(format!(
                "vector store was built with {} ({}) but the embedder is {} ({})",
                self.embedding_backend,
                self.embedding_model.as_deref().unwrap_or("default"),
                other.embedding_backend,
                other.embedding_model.as_deref().unwrap_or("default"),
            ));
        }
        None
    }

    /// Prepares the store for writes from `embedder`.
    ///
    /// A store built by another backend, model or dimension is rejected unless
    /// `reset` is set, in which case every chunk is dropped and the index redefined.
    pub async fn sync_for_ingestion(
        db: &SurrealDbClient,
        embedder: &dyn Embedder,
        reset: bool,
    ) -> Result<Self, AppError> {
        let wanted = Self::from_embedder(embedder);

        match Self::get_current(db).await? {
            Some(existing) => match existing.incompatibility(&wanted) {
                Some(reason) if !reset => {
                    return Err(AppError::Validation(format!(
                        "{reason}; re-run with --reset to rebuild it"
                    )));
                }
                Some(reason) => {
                    warn!(%reason, "Resetting vector store for new embedder");
                    indexes::reset_chunk_indexes(db, wanted.embedding_dimension).await?;
                }
                None if reset => {
                    indexes::reset_chunk_indexes(db, wanted.embedding_dimension).await?;
                }
                None => {
                    indexes::ensure_chunk_indexes(db, wanted.embedding_dimension).await?;
                }
            },
            None => {
                info!(
                    backend = %wanted.embedding_backend,
                    dimension = wanted.embedding_dimension,
                    "Initialising empty vector store"
                );
                indexes::ensure_chunk_indexes(db, wanted.embedding_dimension).await?;
            }
        }

        db.upsert_item(wanted)
            .await?
            .ok_or_else(|| AppError::InternalError("Failed to persist index settings".into()))
    }

    /// Checks that queries from `embedder` can be answered by the store.
    pub async fn verify_for_serving(
        db: &SurrealDbClient,
        embedder: &dyn Embedder,
    ) -> Result<Option<Self>, AppError> {
        let Some(existing) = Self::get_current(db).await? else {
            warn!("Vector store has no index settings; run the ingest command first");
            indexes::ensure_chunk_indexes(db, embedder.dimension()).await?;
            return Ok(None);
        };

        if let Some(reason) = existing.incompatibility(&Self::from_embedder(embedder)) {
            return Err(AppError::Validation(format!(
                "{reason}; configure the same embedder or re-run ingest with --reset"
            )));
        }

        Ok(Some(existing))
    }
}
