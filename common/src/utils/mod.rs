pub mod config;
pub mod embedding;
pub mod llm;
pub mod template_engine;
