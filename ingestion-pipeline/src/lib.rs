#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod chunking;
pub mod loader;
pub mod pipeline;
pub mod utils;

pub use chunking::{CharacterChunker, Chunker};
pub use loader::{load_documents, Document, DocumentKind};
pub use pipeline::{IngestionConfig, IngestionPipeline, IngestionReport};
