use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ChatMessage, CompletionOptions, CompletionProvider, ImageProvider, ImageRequest,
    ProviderError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible `chat/completions` and `images/generations`.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, ProviderError> {
        let response = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };
        debug!(model = %self.model, "requesting chat completion");

        let completion: ChatCompletionResponse = self
            .post_json("chat/completions", &request)
            .await?
            .json()
            .await?;

        completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?
            .message
            .content
            .ok_or(ProviderError::EmptyContent)
    }
}

#[async_trait]
impl ImageProvider for OpenAiClient {
    async fn generate_image(&self, request: ImageRequest) -> Result<String, ProviderError> {
        let body = ImageGenerationRequest {
            prompt: &request.prompt,
            n: 1,
            size: &request.size,
        };
        debug!(size = %request.size, "requesting image generation");

        let generated: ImageGenerationResponse = self
            .post_json("images/generations", &body)
            .await?
            .json()
            .await?;

        generated
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| ProviderError::InvalidResponse("no image url in response".into()))
    }
}

#[cfg(test)]
#[path = "tests/openai_tests.rs"]
mod tests;
