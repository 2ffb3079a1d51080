pub mod answer_retrieval;
pub mod chain;
pub mod retriever;

pub use chain::{ChatAnswer, ConversationalChain};
pub use retriever::retrieve_chunks;
