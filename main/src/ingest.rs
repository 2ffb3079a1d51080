use std::path::PathBuf;

use clap::Parser;
use common::utils::config::get_config;
use rag_chatbot::{init_tracing, run_ingestion, IngestOptions};

/// Loads .txt and .pdf documents, splits and embeds them, and stores the
/// chunks in the vector store used by the chat server.
#[derive(Parser, Debug)]
#[command(name = "ingest", version, about)]
struct Args {
    /// Directory to read documents from [default: config `docs_dir`, i.e. docs/]
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Keep chunks from earlier runs of the same files instead of replacing them
    #[arg(long)]
    append: bool,

    /// Drop every stored chunk and rebuild the index, e.g. after changing the embedding model
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let config = get_config()?;

    let report = run_ingestion(
        &config,
        IngestOptions {
            docs_dir: args.docs_dir,
            append: args.append,
            reset: args.reset,
        },
    )
    .await?;

    println!(
        "Ingestion complete: {} files, {} documents, {} chunks stored in '{}'",
        report.files, report.documents, report.chunks, config.surrealdb_address
    );

    Ok(())
}
