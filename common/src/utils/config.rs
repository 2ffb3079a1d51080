use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    #[default]
    FastEmbed,
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    /// Credential for the Groq API. Only the server requires it.
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,
    #[serde(default)]
    pub llm_temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    #[serde(default = "default_surrealdb_address")]
    pub surrealdb_address: String,
    #[serde(default)]
    pub surrealdb_username: Option<String>,
    #[serde(default)]
    pub surrealdb_password: Option<String>,
    #[serde(default = "default_surrealdb_namespace")]
    pub surrealdb_namespace: String,
    #[serde(default = "default_surrealdb_database")]
    pub surrealdb_database: String,

    #[serde(default)]
    pub embedding_backend: EmbeddingBackendKind,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,

    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_session_max_messages")]
    pub session_max_messages: usize,
    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,
}

fn default_groq_model() -> String {
    "llama-3.1-70b-versatile".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_surrealdb_address() -> String {
    "surrealkv://vectorstore".to_string()
}

fn default_surrealdb_namespace() -> String {
    "rag".to_string()
}

fn default_surrealdb_database() -> String {
    "vectorstore".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_batch_size() -> usize {
    32
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_retrieval_top_k() -> usize {
    4
}

fn default_http_port() -> u16 {
    5000
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

fn default_session_max_messages() -> usize {
    40
}

fn default_session_sweep_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_model: default_groq_model(),
            groq_base_url: default_groq_base_url(),
            llm_temperature: 0.0,
            llm_timeout_secs: default_llm_timeout_secs(),
            surrealdb_address: default_surrealdb_address(),
            surrealdb_username: None,
            surrealdb_password: None,
            surrealdb_namespace: default_surrealdb_namespace(),
            surrealdb_database: default_surrealdb_database(),
            embedding_backend: EmbeddingBackendKind::default(),
            embedding_model: None,
            embedding_dimension: default_embedding_dimension(),
            embedding_batch_size: default_embedding_batch_size(),
            docs_dir: default_docs_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            retrieval_top_k: default_retrieval_top_k(),
            http_port: default_http_port(),
            session_ttl_secs: default_session_ttl_secs(),
            session_max_messages: default_session_max_messages(),
            session_sweep_interval_secs: default_session_sweep_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Returns the Groq credential, failing when it is unset or blank.
    pub fn require_groq_api_key(&self) -> Result<&str, AppError> {
        self.groq_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Validation("GROQ_API_KEY is not set".into()))
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
