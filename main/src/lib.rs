use std::{path::PathBuf, sync::Arc};

use api_router::{api_routes_v1, api_state::ApiState, chat_routes};
use axum::{extract::FromRef, Router};
use common::{
    conversation::ConversationMemory,
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::index_settings::IndexSettings,
        vector_index::{SurrealVectorIndex, VectorIndex},
    },
    utils::{
        config::AppConfig,
        embedding::{Embedder, EmbeddingProvider},
        llm::LanguageModel,
    },
};
use html_router::{html_routes, html_state::HtmlState};
use ingestion_pipeline::{CharacterChunker, IngestionConfig, IngestionPipeline, IngestionReport};
use retrieval_pipeline::ConversationalChain;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub api_state: ApiState,
    pub html_state: HtmlState,
}

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes_v1())
        .merge(chat_routes())
        .merge(html_routes())
        .with_state(state)
}

/// Wires the serving side: embedder, vector index, conversation memory and chain.
pub async fn build_app_state(
    config: &AppConfig,
    db: Arc<SurrealDbClient>,
    llm: Arc<dyn LanguageModel>,
) -> Result<AppState, AppError> {
    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingProvider::from_config(config).await?);
    info!(
        embedding_backend = embedder.backend_label(),
        embedding_dimension = embedder.dimension(),
        "Embedding provider initialized"
    );

    if IndexSettings::verify_for_serving(&db, embedder.as_ref())
        .await?
        .is_none()
    {
        warn!("Answers will have no document context until documents are ingested");
    }

    let index: Arc<dyn VectorIndex> = Arc::new(SurrealVectorIndex::new(Arc::clone(&db)));
    let chain = Arc::new(ConversationalChain::new(
        embedder,
        Arc::clone(&index),
        llm,
        ConversationMemory::from_config(config),
        config.retrieval_top_k,
    ));

    Ok(AppState {
        api_state: ApiState::new(db, index, chain),
        html_state: HtmlState::new(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub docs_dir: Option<PathBuf>,
    pub append: bool,
    pub reset: bool,
}

/// Builds the vector store from the documents directory.
pub async fn run_ingestion(
    config: &AppConfig,
    options: IngestOptions,
) -> Result<IngestionReport, AppError> {
    let docs_dir = options
        .docs_dir
        .unwrap_or_else(|| PathBuf::from(&config.docs_dir));

    let db = Arc::new(SurrealDbClient::from_config(config).await?);
    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingProvider::from_config(config).await?);
    let chunker = Arc::new(CharacterChunker::from_config(config)?);
    let index = Arc::new(SurrealVectorIndex::new(Arc::clone(&db)));

    info!(
        docs_dir = %docs_dir.display(),
        store = %config.surrealdb_address,
        embedding_backend = embedder.backend_label(),
        "Starting ingestion"
    );

    let pipeline = IngestionPipeline::new(
        db,
        chunker,
        embedder,
        index,
        IngestionConfig {
            append: options.append,
            reset: options.reset,
            ..IngestionConfig::from_app_config(config)
        },
    );

    pipeline.run(&docs_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use common::{conversation::Message, utils::config::EmbeddingBackendKind};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct CannedModel;

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _history: &[Message],
            prompt: &str,
        ) -> Result<String, AppError> {
            Ok(if prompt.contains("Ferris") {
                "Ferris is the Rust mascot.".into()
            } else {
                "I don't know.".into()
            })
        }
    }

    fn test_config(database: &str) -> AppConfig {
        AppConfig {
            surrealdb_address: "mem://".into(),
            surrealdb_namespace: "test_ns".into(),
            surrealdb_database: database.into(),
            embedding_backend: EmbeddingBackendKind::Hashed,
            embedding_dimension: 128,
            http_port: 0,
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn smoke_startup_with_in_memory_surrealdb() {
        let database = format!("test_db_{}", Uuid::new_v4());
        let config = test_config(&database);
        let db = Arc::new(
            SurrealDbClient::memory(&config.surrealdb_namespace, &database)
                .await
                .expect("failed to start in-memory surrealdb"),
        );

        let state = build_app_state(&config, db, Arc::new(CannedModel))
            .await
            .expect("failed to build app state");
        let app = build_router(state);

        for uri in ["/", "/api/v1/live", "/api/v1/ready"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
                .await
                .expect("router response");
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"Who is Ferris?"}"#))
                    .expect("request"),
            )
            .await
            .expect("chat response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["answer"], "Ferris is the Rust mascot.");
    }

    #[tokio::test]
    async fn ingestion_uses_configured_docs_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(
            dir.path().join("mascot.txt"),
            "Ferris the crab is the unofficial mascot of Rust.",
        )
        .await
        .expect("write");

        let config = AppConfig {
            docs_dir: dir.path().to_string_lossy().into_owned(),
            ..test_config(&Uuid::new_v4().to_string())
        };

        let report = run_ingestion(&config, IngestOptions::default())
            .await
            .expect("ingestion");

        assert_eq!(report.files, 1);
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 1);
    }
}
