use common::{
    conversation::{format_history, Message},
    storage::vector_index::RetrievedChunk,
};
use serde_json::Value;

pub static ANSWER_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that answers questions about a collection of documents. You will be given excerpts from those documents as context, each with its source file and a similarity score.

Your task is to:
1. Answer the user's question using only the provided context
2. Keep answers clear and concise
3. If the context does not contain the answer, say that you don't know instead of making one up
4. Answer in the language the question was asked in"#;

pub static CONDENSE_SYSTEM_PROMPT: &str = r#"You rewrite follow-up questions. Given a conversation and a follow-up question, rephrase the follow-up as a standalone question that can be understood without the conversation, in its original language. Reply with the standalone question only."#;

/// Retrieved chunks as JSON context for the answer prompt.
pub fn chunks_to_chat_context(chunks: &[RetrievedChunk]) -> Value {
    fn round_score(value: f32) -> f64 {
        (f64::from(value) * 1000.0).round() / 1000.0
    }

    serde_json::json!(chunks
        .iter()
        .map(|chunk| {
            serde_json::json!({
                "source": chunk.source,
                "page": chunk.page,
                "content": chunk.text,
                "score": round_score(chunk.score),
            })
        })
        .collect::<Vec<_>>())
}

pub fn create_user_message(context_json: &Value, query: &str) -> String {
    format!(
        r"
        Context Information:
        ==================
        {context_json}

        User Question:
        ==================
        {query}
        "
    )
}

pub fn create_condense_message(history: &[Message], follow_up: &str) -> String {
    format!(
        r"
        Chat history:
        ==================
        {}

        Follow-up question:
        ==================
        {}

        Standalone question:
        ",
        format_history(history),
        follow_up
    )
}

/// Distinct source paths in ranking order.
pub fn distinct_sources(chunks: &[RetrievedChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if !sources.contains(&chunk.source) {
            sources.push(chunk.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: format!("text_chunk:{text}"),
            source: source.into(),
            page: None,
            chunk_index: 0,
            text: text.into(),
            score,
        }
    }

    #[test]
    fn context_carries_source_and_rounded_score() {
        let context = chunks_to_chat_context(&[chunk("docs/a.txt", "alpha", 0.123_456)]);

        assert_eq!(context[0]["source"], "docs/a.txt");
        assert_eq!(context[0]["content"], "alpha");
        assert_eq!(context[0]["score"], 0.123);
        assert!(context[0]["page"].is_null());
    }

    #[test]
    fn user_message_includes_context_and_question() {
        let context = chunks_to_chat_context(&[chunk("docs/a.txt", "alpha", 0.9)]);
        let message = create_user_message(&context, "What is alpha?");

        assert!(message.contains("alpha"));
        assert!(message.contains("What is alpha?"));
    }

    #[test]
    fn condense_message_includes_history() {
        let history = vec![Message::user("Who wrote it?"), Message::ai("Ferris.")];
        let message = create_condense_message(&history, "When?");

        assert!(message.contains("Human: Who wrote it?"));
        assert!(message.contains("Assistant: Ferris."));
        assert!(message.contains("When?"));
    }

    #[test]
    fn sources_are_deduplicated_in_order() {
        let chunks = vec![
            chunk("docs/b.txt", "one", 0.9),
            chunk("docs/a.txt", "two", 0.8),
            chunk("docs/b.txt", "three", 0.7),
        ];
        assert_eq!(distinct_sources(&chunks), vec!["docs/b.txt", "docs/a.txt"]);
    }
}
