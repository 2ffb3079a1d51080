pub mod memory;
pub mod message;

pub use memory::ConversationMemory;
pub use message::{format_history, Message, MessageRole};
