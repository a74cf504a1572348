//! Language model gateway: grounded prompt in, answer text out.
//!
//! Two consumption modes share one request shape: a blocking
//! [`LanguageModel::generate`] used by the query engine and its tests,
//! and a lazy, finite, non-restartable fragment stream for interactive
//! display.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::models::{ConversationTurn, LlmConfig};
use crate::utils::retry::{RetryConfig, with_retry};

/// A fully assembled prompt: grounding instructions plus retrieved
/// context, the prior conversation, and the new question.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    /// System message carrying the grounding instructions and the
    /// retrieved chunk texts.
    pub system: String,
    /// Prior turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The new user question.
    pub question: String,
}

/// Lazy sequence of answer fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Capability interface over a chat language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate the full answer in one call.
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, GenerationError>;

    /// Generate the answer as a stream of text fragments.
    fn generate_stream(&self, prompt: ChatPrompt) -> TokenStream;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct ChatStreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryConfig::default(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, prompt: &'a ChatPrompt, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(prompt.history.len() * 2 + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &prompt.system,
        });
        for turn in &prompt.history {
            messages.push(ChatMessage {
                role: "user",
                content: &turn.question,
            });
            messages.push(ChatMessage {
                role: "assistant",
                content: &turn.answer,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.question,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        }
    }

    async fn send(
        &self,
        prompt: &ChatPrompt,
        stream: bool,
    ) -> Result<reqwest::Response, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt, stream))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider(format!("status {status}: {body}")));
        }

        Ok(response)
    }

    async fn request_completion(&self, prompt: &ChatPrompt) -> Result<String, GenerationError> {
        let response = self.send(prompt, false).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("no completion choices".to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, GenerationError> {
        with_retry(&self.retry, || self.request_completion(prompt)).await
    }

    fn generate_stream(&self, prompt: ChatPrompt) -> TokenStream {
        let this = self.clone();

        Box::pin(async_stream::try_stream! {
            let response = this.send(&prompt, true).await?;
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| GenerationError::Stream(e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE events are newline-delimited `data:` lines
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }

                    let parsed: ChatStreamChunk = serde_json::from_str(data)
                        .map_err(|e| GenerationError::Stream(e.to_string()))?;
                    if let Some(fragment) = parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        && !fragment.is_empty()
                    {
                        yield fragment;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> ChatPrompt {
        ChatPrompt {
            system: "Answer from the context.".to_string(),
            history: vec![ConversationTurn::new("hi", "hello")],
            question: "What now?".to_string(),
        }
    }

    #[test]
    fn test_build_request_message_order() {
        let client =
            OpenAiChatClient::new(&LlmConfig::default(), "sk-test".to_string()).unwrap();
        let prompt = prompt();
        let request = client.build_request(&prompt, false);

        // system, then user/assistant per turn, then the new question
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "hi");
        assert_eq!(request.messages[2].role, "assistant");
        assert_eq!(request.messages[3].role, "user");
        assert_eq!(request.messages[3].content, "What now?");
        assert!(!request.stream);
    }

    #[test]
    fn test_stream_flag_serialization() {
        let client =
            OpenAiChatClient::new(&LlmConfig::default(), "sk-test".to_string()).unwrap();

        let blocking = serde_json::to_value(client.build_request(&prompt(), false)).unwrap();
        assert!(blocking.get("stream").is_none());

        let streaming = serde_json::to_value(client.build_request(&prompt(), true)).unwrap();
        assert_eq!(streaming["stream"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_stream_chunk_parsing() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        let parsed: ChatStreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("Hel"));

        let done_role = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        let parsed: ChatStreamChunk = serde_json::from_str(done_role).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
    }
}
