use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use common::{
    conversation::{ConversationMemory, Message},
    error::AppError,
    storage::vector_index::VectorIndex,
    utils::{embedding::Embedder, llm::LanguageModel},
};

use crate::{
    answer_retrieval::{
        chunks_to_chat_context, create_condense_message, create_user_message, distinct_sources,
        ANSWER_SYSTEM_PROMPT, CONDENSE_SYSTEM_PROMPT,
    },
    retriever::retrieve_chunks,
};

#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub session_id: String,
    pub sources: Vec<String>,
}

/// Conversational retrieval: condense the follow-up against the session history,
/// retrieve context for it, answer, then remember the exchange.
pub struct ConversationalChain {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LanguageModel>,
    memory: ConversationMemory,
    top_k: usize,
}

impl ConversationalChain {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        memory: ConversationMemory,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            memory,
            top_k,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    #[instrument(skip_all, fields(session_id = tracing::field::Empty))]
    pub async fn ask(
        &self,
        session_id: Option<&str>,
        question: &str,
    ) -> Result<ChatAnswer, AppError> {
        let session_id = self.memory.open_session(session_id).await;
        tracing::Span::current().record("session_id", session_id.as_str());

        let history = self.memory.history(&session_id).await;
        let has_question = !question.trim().is_empty();

        let standalone = if has_question && !history.is_empty() {
            self.condense(&history, question).await?
        } else {
            question.to_owned()
        };

        let chunks = if has_question {
            retrieve_chunks(
                self.embedder.as_ref(),
                self.index.as_ref(),
                &standalone,
                self.top_k,
            )
            .await?
        } else {
            Vec::new()
        };

        let context = chunks_to_chat_context(&chunks);
        let user_message = create_user_message(&context, &standalone);
        let answer = self
            .llm
            .complete(ANSWER_SYSTEM_PROMPT, &history, &user_message)
            .await?;

        self.memory
            .append_turn(&session_id, question, &answer)
            .await;

        info!(
            model = self.llm.model_name(),
            chunks = chunks.len(),
            history = history.len(),
            "answered question"
        );

        Ok(ChatAnswer {
            answer,
            sources: distinct_sources(&chunks),
            session_id,
        })
    }

    async fn condense(
        &self,
        history: &[Message],
        question: &str,
    ) -> Result<String, AppError> {
        let prompt = create_condense_message(history, question);
        let standalone = self
            .llm
            .complete(CONDENSE_SYSTEM_PROMPT, &[], &prompt)
            .await?;
        debug!(%standalone, "condensed follow-up question");

        Ok(standalone)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, time::Duration};

    use async_trait::async_trait;
    use common::{
        conversation::MessageRole,
        storage::vector_index::SurrealVectorIndex,
        utils::embedding::EmbeddingProvider,
    };
    use tokio::sync::Mutex;

    use super::*;
    use crate::tests::{seeded_index, TEST_DIMENSION};

    #[derive(Debug, Clone)]
    struct RecordedCall {
        system_prompt: String,
        history: Vec<Message>,
        prompt: String,
    }

    /// Replies from a script and records every request.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, AppError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedModel {
        fn with_replies(replies: Vec<Result<String, AppError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        async fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            system_prompt: &str,
            history: &[Message],
            prompt: &str,
        ) -> Result<String, AppError> {
            self.calls.lock().await.push(RecordedCall {
                system_prompt: system_prompt.to_owned(),
                history: history.to_vec(),
                prompt: prompt.to_owned(),
            });
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok("default answer".into()))
        }
    }

    async fn chain_with(model: Arc<ScriptedModel>) -> ConversationalChain {
        let (_db, index): (_, SurrealVectorIndex) = seeded_index().await;
        ConversationalChain::new(
            Arc::new(EmbeddingProvider::new_hashed(TEST_DIMENSION)),
            Arc::new(index),
            model,
            ConversationMemory::new(Duration::from_secs(60), 20),
            2,
        )
    }

    #[tokio::test]
    async fn first_question_is_answered_from_retrieved_context() {
        let model = ScriptedModel::with_replies(vec![Ok("Simmer tomatoes with basil.".into())]);
        let chain = chain_with(Arc::clone(&model)).await;

        let answer = chain
            .ask(None, "How do I make tomato sauce with basil?")
            .await
            .expect("answer");

        assert_eq!(answer.answer, "Simmer tomatoes with basil.");
        assert_eq!(answer.sources.first().map(String::as_str), Some("docs/cooking.txt"));
        assert!(!answer.session_id.is_empty());

        let calls = model.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system_prompt, ANSWER_SYSTEM_PROMPT);
        assert!(calls[0].history.is_empty());
        assert!(calls[0].prompt.contains("olive oil"));
        assert!(calls[0].prompt.contains("How do I make tomato sauce with basil?"));

        let history = chain.memory().history(&answer.session_id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].content, "Simmer tomatoes with basil.");
    }

    #[tokio::test]
    async fn follow_up_is_condensed_with_history() {
        let model = ScriptedModel::with_replies(vec![
            Ok("Jupiter.".into()),
            Ok("How many moons did Galileo discover around Jupiter?".into()),
            Ok("Four.".into()),
        ]);
        let chain = chain_with(Arc::clone(&model)).await;

        let first = chain
            .ask(None, "Which planet is the largest?")
            .await
            .expect("first answer");
        let second = chain
            .ask(Some(&first.session_id), "How many moons did Galileo find there?")
            .await
            .expect("second answer");

        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.answer, "Four.");
        assert_eq!(second.sources.first().map(String::as_str), Some("docs/astronomy.txt"));

        let calls = model.calls().await;
        assert_eq!(calls.len(), 3);

        let condense = &calls[1];
        assert_eq!(condense.system_prompt, CONDENSE_SYSTEM_PROMPT);
        assert!(condense.history.is_empty());
        assert!(condense.prompt.contains("Human: Which planet is the largest?"));
        assert!(condense.prompt.contains("Assistant: Jupiter."));
        assert!(condense.prompt.contains("How many moons did Galileo find there?"));

        let answer = &calls[2];
        assert_eq!(answer.history.len(), 2);
        assert!(answer
            .prompt
            .contains("How many moons did Galileo discover around Jupiter?"));

        assert_eq!(chain.memory().history(&first.session_id).await.len(), 4);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let model = ScriptedModel::with_replies(Vec::new());
        let chain = chain_with(Arc::clone(&model)).await;

        let alice = chain.ask(Some("alice"), "What is the borrow checker?").await.expect("alice");
        let bob = chain.ask(Some("bob"), "What is the borrow checker?").await.expect("bob");

        assert_eq!(alice.session_id, "alice");
        assert_eq!(bob.session_id, "bob");

        let calls = model.calls().await;
        assert_eq!(calls.len(), 2, "no condensing for a fresh session");
        assert!(calls[1].history.is_empty());
        assert_eq!(chain.memory().history("alice").await.len(), 2);
        assert_eq!(chain.memory().history("bob").await.len(), 2);
    }

    #[tokio::test]
    async fn blank_question_skips_retrieval_and_condensing() {
        let model = ScriptedModel::with_replies(vec![
            Ok("Hello!".into()),
            Ok("Could you ask a question?".into()),
        ]);
        let chain = chain_with(Arc::clone(&model)).await;

        let first = chain.ask(None, "Hi there").await.expect("first");
        let blank = chain
            .ask(Some(&first.session_id), "   ")
            .await
            .expect("blank question still answers");

        assert_eq!(blank.answer, "Could you ask a question?");
        assert!(blank.sources.is_empty());

        let calls = model.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].system_prompt, ANSWER_SYSTEM_PROMPT);
        assert_eq!(calls[1].history.len(), 2);
    }

    #[tokio::test]
    async fn llm_failure_leaves_memory_untouched() {
        let model = ScriptedModel::with_replies(vec![Err(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))]);
        let chain = chain_with(Arc::clone(&model)).await;

        let result = chain.ask(Some("s1"), "What is Jupiter?").await;

        assert!(matches!(result, Err(AppError::LLMParsing(_))));
        assert!(chain.memory().history("s1").await.is_empty());
    }
}
