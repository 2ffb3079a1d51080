#![allow(clippy::module_name_repetitions)]
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum MessageRole {
    User,
    AI,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into())
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(MessageRole::AI, content.into())
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "Human"),
            MessageRole::AI => write!(f, "Assistant"),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

// helper function to format a vector of messages
pub fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|msg| format!("{msg}"))
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_display() {
        assert_eq!(format!("{}", MessageRole::User), "Human");
        assert_eq!(format!("{}", MessageRole::AI), "Assistant");
    }

    #[test]
    fn test_format_history() {
        let messages = vec![Message::user("Hello"), Message::ai("Hi there!")];

        assert_eq!(format_history(&messages), "Human: Hello\nAssistant: Hi there!");
        assert_eq!(format_history(&[]), "");
    }
}
