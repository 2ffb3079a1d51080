use std::{sync::Arc, time::Duration};

use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, llm::OpenAiCompatibleModel},
};
use rag_chatbot::{build_app_state, build_router, init_tracing};
use tracing::info;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = get_config()?;

    // Fails fast when GROQ_API_KEY is missing
    let llm = Arc::new(OpenAiCompatibleModel::from_config(&config)?);
    info!(model = %config.groq_model, base_url = %config.groq_base_url, "Language model configured");

    let db = Arc::new(SurrealDbClient::from_config(&config).await?);
    let state = build_app_state(&config, db, llm).await?;

    let sweeper = state.api_state.chain.memory().spawn_sweeper(Duration::from_secs(
        config.session_sweep_interval_secs.max(1),
    ));

    let app = build_router(state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
