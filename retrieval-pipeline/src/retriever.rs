use tracing::{debug, instrument};

use common::{
    error::AppError,
    storage::vector_index::{RetrievedChunk, VectorIndex},
    utils::embedding::{is_zero_vector, Embedder},
};

/// Embeds `question` and returns the `top_k` closest chunks, best first.
#[instrument(skip_all, fields(top_k = top_k))]
pub async fn retrieve_chunks(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    question: &str,
    top_k: usize,
) -> Result<Vec<RetrievedChunk>, AppError> {
    if question.trim().is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let embedding = embedder.embed(question).await?;
    if is_zero_vector(&embedding) {
        debug!("question embedding has no direction; skipping vector search");
        return Ok(Vec::new());
    }

    let chunks = index.query(&embedding, top_k).await?;
    debug!(found = chunks.len(), "retrieved chunks");

    Ok(chunks)
}
