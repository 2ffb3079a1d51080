use std::{sync::Arc, time::Duration};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use crate::{
    conversation::{Message, MessageRole},
    error::AppError,
    utils::config::AppConfig,
};

pub type OpenAIClientType = Client<OpenAIConfig>;

/// Chat-completion backend: system prompt + prior turns + new prompt → completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        prompt: &str,
    ) -> Result<String, AppError>;
}

/// Any OpenAI-compatible chat endpoint; configured for Groq by default.
pub struct OpenAiCompatibleModel {
    client: Arc<OpenAIClientType>,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleModel {
    pub fn new(client: Arc<OpenAIClientType>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let api_key = config.require_groq_api_key()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&config.groq_base_url),
        )
        .with_http_client(http_client);

        Ok(Self::new(
            Arc::new(client),
            config.groq_model.clone(),
            config.llm_temperature,
        ))
    }

    pub fn build_request(
        &self,
        system_prompt: &str,
        history: &[Message],
        prompt: &str,
    ) -> Result<CreateChatCompletionRequest, AppError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len().saturating_add(2));
        messages.push(ChatCompletionRequestSystemMessage::from(system_prompt).into());

        for message in history {
            let entry: ChatCompletionRequestMessage = match message.role {
                MessageRole::User => {
                    ChatCompletionRequestUserMessage::from(message.content.as_str()).into()
                }
                MessageRole::AI => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
            };
            messages.push(entry);
        }

        messages.push(ChatCompletionRequestUserMessage::from(prompt).into());

        Ok(CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(messages)
            .build()?)
    }
}

pub fn first_choice_content(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        prompt: &str,
    ) -> Result<String, AppError> {
        let request = self.build_request(system_prompt, history, prompt)?;
        let response = self.client.chat().create(request).await?;
        debug!(
            model = %self.model,
            usage = ?response.usage,
            "chat completion received"
        );

        first_choice_content(response)
    }
}
