use tracing::info;

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{text_chunk::TextChunk, StoredObject},
    },
};

pub const CHUNK_EMBEDDING_INDEX: &str = "idx_embedding_text_chunk";
const CHUNK_SOURCE_INDEX: &str = "idx_text_chunk_source";

#[derive(Clone, Copy)]
struct HnswIndexSpec {
    index_name: &'static str,
    table: &'static str,
    options: &'static str,
}

impl HnswIndexSpec {
    fn definition_if_not_exists(&self, dimension: usize) -> String {
        format!(
            "DEFINE INDEX IF NOT EXISTS {index} ON TABLE {table} \
             FIELDS embedding HNSW DIMENSION {dimension} {options};",
            index = self.index_name,
            table = self.table,
            dimension = dimension,
            options = self.options,
        )
    }

    fn definition_overwrite(&self, dimension: usize) -> String {
        format!(
            "DEFINE INDEX OVERWRITE {index} ON TABLE {table} \
             FIELDS embedding HNSW DIMENSION {dimension} {options};",
            index = self.index_name,
            table = self.table,
            dimension = dimension,
            options = self.options,
        )
    }
}

fn chunk_hnsw_spec() -> HnswIndexSpec {
    HnswIndexSpec {
        index_name: CHUNK_EMBEDDING_INDEX,
        table: TextChunk::table_name(),
        options: "DIST COSINE TYPE F32",
    }
}

/// Defines the chunk indexes when missing. Idempotent.
pub async fn ensure_chunk_indexes(
    db: &SurrealDbClient,
    embedding_dimension: usize,
) -> Result<(), AppError> {
    let definitions = format!(
        "{hnsw}\nDEFINE INDEX IF NOT EXISTS {CHUNK_SOURCE_INDEX} ON TABLE {table} FIELDS source;",
        hnsw = chunk_hnsw_spec().definition_if_not_exists(embedding_dimension),
        table = TextChunk::table_name(),
    );

    db.client.query(definitions).await?.check()?;
    info!(
        index = CHUNK_EMBEDDING_INDEX,
        dimension = embedding_dimension,
        "chunk indexes ready"
    );

    Ok(())
}

/// Removes every chunk and redefines the HNSW index for a new dimension.
pub async fn reset_chunk_indexes(
    db: &SurrealDbClient,
    embedding_dimension: usize,
) -> Result<(), AppError> {
    let query = format!(
        "BEGIN TRANSACTION;
         DELETE {table};
         {hnsw}
         COMMIT TRANSACTION;",
        table = TextChunk::table_name(),
        hnsw = chunk_hnsw_spec().definition_overwrite(embedding_dimension),
    );

    db.client.query(query).await?.check()?;
    info!(
        index = CHUNK_EMBEDDING_INDEX,
        dimension = embedding_dimension,
        "chunk table cleared and HNSW index redefined"
    );

    ensure_chunk_indexes(db, embedding_dimension).await
}
