use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

stored_object!(TextChunk, "text_chunk", {
    /// Path of the document the chunk was cut from
    source: String,
    /// 1-based page number for paginated sources
    page: Option<u32>,
    /// Position of the chunk within its document
    chunk_index: u32,
    chunk: String,
    embedding: Vec<f32>
});

/// Row shape returned by the KNN query: chunk fields plus the index distance.
#[derive(Debug, Deserialize)]
pub struct ChunkSearchRow {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub chunk_index: u32,
    pub chunk: String,
    pub distance: f32,
}

impl TextChunk {
    pub fn new(
        source: String,
        page: Option<u32>,
        chunk_index: u32,
        chunk: String,
        embedding: Vec<f32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            source,
            page,
            chunk_index,
            chunk,
            embedding,
        }
    }

    pub async fn delete_by_source(source: &str, db_client: &SurrealDbClient) -> Result<(), AppError> {
        db_client
            .query("DELETE type::table($table) WHERE source = $source")
            .bind(("table", Self::table_name()))
            .bind(("source", source.to_owned()))
            .await?
            .check()?;

        Ok(())
    }

    pub async fn count(db_client: &SurrealDbClient) -> Result<usize, AppError> {
        let count: Option<usize> = db_client
            .query("SELECT count() FROM type::table($table) GROUP ALL")
            .bind(("table", Self::table_name()))
            .await?
            .take((0, "count"))?;

        Ok(count.unwrap_or(0))
    }

    /// Nearest chunks to `embedding` through the HNSW index, closest first.
    pub async fn search_nearest(
        embedding: Vec<f32>,
        take: usize,
        db_client: &SurrealDbClient,
    ) -> Result<Vec<ChunkSearchRow>, AppError> {
        if take == 0 {
            return Ok(Vec::new());
        }

        let closest_query = format!(
            "SELECT id, source, page, chunk_index, chunk, vector::distance::knn() AS distance \
             FROM {} WHERE embedding <|{},{}|> $embedding ORDER BY distance",
            Self::table_name(),
            take,
            take.max(40)
        );

        let rows: Vec<ChunkSearchRow> = db_client
            .query(closest_query)
            .bind(("embedding", embedding))
            .await?
            .take(0)?;

        Ok(rows)
    }
}
