use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use common::error::AppError;
use std::sync::Arc;
use tokio::time::timeout;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::debug;

static ANSWER_SYSTEM_PROMPT: &str =
    "You answer user questions from supplied context. Be direct and concise.";

/// Seam for the downstream language model so the query orchestrator can
/// be exercised without network access.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn answer(&self, prompt: String) -> Result<String, AppError>;
}

/// Production client: chat completions through `async-openai`, transient
/// network failures retried with bounded jittered backoff, the whole call
/// bounded by a configurable timeout. Timeout is terminal for the
/// request.
pub struct OpenAiLlmClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    timeout_secs: u64,
}

impl OpenAiLlmClient {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, timeout_secs: u64) -> Self {
        Self {
            client,
            model,
            timeout_secs,
        }
    }

    async fn request_completion(
        &self,
        prompt: String,
    ) -> Result<CreateChatCompletionResponse, OpenAIError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessage::from(ANSWER_SYSTEM_PROMPT).into(),
                ChatCompletionRequestUserMessage::from(prompt).into(),
            ])
            .build()?;

        self.client.chat().create(request).await
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn answer(&self, prompt: String) -> Result<String, AppError> {
        let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            RetryIf::spawn(
                retry_strategy,
                || self.request_completion(prompt.clone()),
                is_transient,
            ),
        )
        .await
        .map_err(|_| AppError::ModelTimeout(self.timeout_secs))??;

        debug!(model = %self.model, "received chat completion");
        extract_answer(response)
    }
}

fn is_transient(err: &OpenAIError) -> bool {
    matches!(err, OpenAIError::Reqwest(_))
}

fn extract_answer(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.is_empty())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
}
