use anyhow::Result;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use std::pin::Pin;

/// Represents the events that can be yielded from a streaming text response.
#[derive(Debug, Clone)]
pub enum LLMStreamEvent {
    TextChunk(String),
}

/// A stream of text chunks from the LLM.
pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMStreamEvent, OpenAIError>> + Send>>;

/// A generic client for interacting with an LLM.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a streaming chat-completion call for a single rendered prompt.
    ///
    /// The returned stream is finite and non-restartable: chunks must be
    /// consumed in emission order and the stream terminates when the backend
    /// signals completion.
    async fn stream_completion(&self, prompt: String) -> Result<LLMStream>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The specific model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn stream_completion(&self, prompt: String) -> Result<LLMStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .stream(true)
            .build()?;

        let stream = self.client.chat().create_stream(request).await?;

        Ok(Box::pin(stream.filter_map(|result| async {
            match result {
                Ok(response) => {
                    let choice = &response.choices[0];
                    if let Some(content) = &choice.delta.content {
                        if !content.is_empty() {
                            return Some(Ok(LLMStreamEvent::TextChunk(content.clone())));
                        }
                    }
                    None
                }
                Err(e) => Some(Err(e)),
            }
        })))
    }
}

/// An `LLMClient` that replays a fixed script of chunks.
///
/// This implementation provides predictable, deterministic output, which is
/// useful for development and testing scenarios without external
/// dependencies or API costs.
pub struct CannedClient {
    chunks: Vec<String>,
}

impl CannedClient {
    /// Creates a client that yields `chunks` in order on every call.
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl LLMClient for CannedClient {
    async fn stream_completion(&self, _prompt: String) -> Result<LLMStream> {
        let items: Vec<Result<LLMStreamEvent, OpenAIError>> = self
            .chunks
            .iter()
            .cloned()
            .map(|chunk| Ok(LLMStreamEvent::TextChunk(chunk)))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_client_replays_script_in_order() {
        let client = CannedClient::new(vec!["one ".to_string(), "two".to_string()]);
        let mut stream = client
            .stream_completion("ignored".to_string())
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(event) = stream.next().await {
            let LLMStreamEvent::TextChunk(chunk) = event.unwrap();
            chunks.push(chunk);
        }
        assert_eq!(chunks, vec!["one ", "two"]);
    }

    #[tokio::test]
    async fn canned_client_with_empty_script_terminates_immediately() {
        let client = CannedClient::new(vec![]);
        let mut stream = client
            .stream_completion("ignored".to_string())
            .await
            .unwrap();
        assert!(stream.next().await.is_none());
    }
}
