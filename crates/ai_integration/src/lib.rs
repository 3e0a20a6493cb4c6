//! Seams to the two generative collaborators: a chat-completion model that
//! writes stanzas and an image model that illustrates them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod openai;

pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Provider resolution string, e.g. `512x512`.
    pub size: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response was malformed: {0}")]
    InvalidResponse(String),
    #[error("provider returned empty content")]
    EmptyContent,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model's reply text, untrimmed.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates exactly one image and returns its hosted URL.
    async fn generate_image(&self, request: ImageRequest) -> Result<String, ProviderError>;
}
