use std::sync::Arc;

use common::storage::{db::SurrealDbClient, vector_index::VectorIndex};
use retrieval_pipeline::ConversationalChain;

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub index: Arc<dyn VectorIndex>,
    pub chain: Arc<ConversationalChain>,
}

impl ApiState {
    pub fn new(
        db: Arc<SurrealDbClient>,
        index: Arc<dyn VectorIndex>,
        chain: Arc<ConversationalChain>,
    ) -> Self {
        Self { db, index, chain }
    }
}
