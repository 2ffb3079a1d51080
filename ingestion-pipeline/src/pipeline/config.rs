use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub embedding_batch_size: usize,
    /// Keep existing chunks of a source instead of replacing them.
    pub append: bool,
    /// Drop every stored chunk and redefine the index before ingesting.
    pub reset: bool,
    pub embedding_attempts: usize,
    pub embedding_retry_base_ms: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            embedding_batch_size: 32,
            append: false,
            reset: false,
            embedding_attempts: 3,
            embedding_retry_base_ms: 100,
        }
    }
}

impl IngestionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            embedding_batch_size: config.embedding_batch_size.max(1),
            ..Self::default()
        }
    }
}
