use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::StanzaEntry,
    protocol::{
        GenerateImageRequest, GenerateImageResponse, GenerateStanzaRequest,
        GenerateStanzaResponse, PoemResponse, GENERATE_IMAGE_ROUTE, GENERATE_STANZA_ROUTE,
        POEM_ROUTE,
    },
};
use url::Url;

mod composer;
pub mod composition;

pub use composer::{Composer, ComposerEvent};
pub use composition::{CompositionState, Phase, StepOutcome, StepRequest};

/// The four calls the composition workflow makes against the poem server.
#[async_trait]
pub trait PoemApi: Send + Sync {
    async fn fetch_poem(&self) -> Result<Vec<StanzaEntry>>;
    async fn clear_poem(&self) -> Result<()>;
    async fn generate_stanza(&self, user_contribution: &str) -> Result<String>;
    /// Illustrates `stanza`; the server appends it to the poem on success.
    async fn generate_image(&self, stanza: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct HttpPoemApi {
    http: Client,
    server_url: String,
}

impl HttpPoemApi {
    pub fn new(server_url: &str) -> Result<Self> {
        let parsed = Url::parse(server_url)
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("server url must be http or https, got '{server_url}'"));
        }
        Ok(Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.server_url)
    }
}

#[async_trait]
impl PoemApi for HttpPoemApi {
    async fn fetch_poem(&self) -> Result<Vec<StanzaEntry>> {
        let body: PoemResponse = self
            .http
            .get(self.endpoint(POEM_ROUTE))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.poem)
    }

    async fn clear_poem(&self) -> Result<()> {
        self.http
            .delete(self.endpoint(POEM_ROUTE))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn generate_stanza(&self, user_contribution: &str) -> Result<String> {
        let body: GenerateStanzaResponse = self
            .http
            .post(self.endpoint(GENERATE_STANZA_ROUTE))
            .json(&GenerateStanzaRequest {
                user_contribution: Some(user_contribution.to_string()),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.stanza)
    }

    async fn generate_image(&self, stanza: &str) -> Result<String> {
        let body: GenerateImageResponse = self
            .http
            .post(self.endpoint(GENERATE_IMAGE_ROUTE))
            .json(&GenerateImageRequest {
                stanza: Some(stanza.to_string()),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.image_url)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
