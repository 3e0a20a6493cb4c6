use std::sync::Arc;

use ai_integration::{
    ChatMessage, CompletionOptions, CompletionProvider, ImageProvider, ImageRequest,
};
use shared::{
    domain::StanzaEntry,
    error::ApiError,
    protocol::{ClearPoemResponse, GenerateImageResponse, GenerateStanzaResponse, PoemResponse},
};
use storage::PoemStore;
use tracing::{error, info};

pub const USER_CONTRIBUTION_REQUIRED: &str = "User contribution is required.";
pub const STANZA_REQUIRED: &str = "Stanza text is required.";
pub const STANZA_GENERATION_FAILED: &str = "Failed to generate stanza.";
pub const IMAGE_GENERATION_FAILED: &str = "Failed to generate image.";
pub const POEM_CLEARED: &str = "Poem cleared successfully.";

const POET_INSTRUCTION: &str = "You are a helpful, creative poet who extends poems \
in a consistent style and tone. Write exactly one short stanza (1-3 lines).";

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub completion: CompletionOptions,
    pub image_size: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            completion: CompletionOptions::default(),
            image_size: "512x512".into(),
        }
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub store: PoemStore,
    pub completion: Arc<dyn CompletionProvider>,
    pub images: Arc<dyn ImageProvider>,
    pub generation: GenerationSettings,
}

pub async fn get_poem(ctx: &ApiContext) -> PoemResponse {
    PoemResponse {
        poem: ctx.store.get().await,
    }
}

pub async fn clear_poem(ctx: &ApiContext) -> ClearPoemResponse {
    ctx.store.clear().await;
    ClearPoemResponse {
        message: POEM_CLEARED.to_string(),
    }
}

/// Asks the completion model to continue the poem. The store is only read.
pub async fn generate_stanza(
    ctx: &ApiContext,
    user_contribution: Option<&str>,
) -> Result<GenerateStanzaResponse, ApiError> {
    let user_contribution = required(user_contribution, USER_CONTRIBUTION_REQUIRED)?;
    let poem_so_far = ctx.store.stanza_texts().await.join("\n");

    let reply = ctx
        .completion
        .complete(
            stanza_messages(&poem_so_far, user_contribution),
            &ctx.generation.completion,
        )
        .await
        .map_err(|err| {
            error!(%err, "error generating stanza");
            ApiError::provider(STANZA_GENERATION_FAILED)
        })?;

    let stanza = reply.trim();
    if stanza.is_empty() {
        error!("completion provider returned a blank stanza");
        return Err(ApiError::provider(STANZA_GENERATION_FAILED));
    }
    Ok(GenerateStanzaResponse {
        stanza: stanza.to_string(),
    })
}

/// Illustrates a stanza and, only when that succeeds, appends it to the poem.
pub async fn generate_image(
    ctx: &ApiContext,
    stanza: Option<&str>,
) -> Result<GenerateImageResponse, ApiError> {
    let stanza = required(stanza, STANZA_REQUIRED)?;

    let image_url = ctx
        .images
        .generate_image(ImageRequest {
            prompt: image_prompt(stanza),
            size: ctx.generation.image_size.clone(),
        })
        .await
        .map_err(|err| {
            error!(%err, "error generating image");
            ApiError::provider(IMAGE_GENERATION_FAILED)
        })?;

    let len = ctx
        .store
        .append(StanzaEntry::illustrated(stanza, image_url.clone()))
        .await;
    info!(len, "illustrated stanza added to poem");
    Ok(GenerateImageResponse { image_url })
}

pub fn stanza_messages(poem_so_far: &str, user_contribution: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(POET_INSTRUCTION),
        ChatMessage::user(format!(
            "So far, the poem is:\n\"{poem_so_far}\"\n\nThe user added: \"{user_contribution}\"\n\
             Please continue the poem with one additional stanza in a similar style."
        )),
    ]
}

pub fn image_prompt(stanza: &str) -> String {
    format!(
        "Create a single illustration in a watercolor style inspired by this poetic stanza:\n\"{stanza}\""
    )
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
