use serde::{Deserialize, Serialize};

use crate::domain::StanzaEntry;

pub const POEM_ROUTE: &str = "/api/poem";
pub const GENERATE_STANZA_ROUTE: &str = "/api/generate-stanza";
pub const GENERATE_IMAGE_ROUTE: &str = "/api/generate-image";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemResponse {
    pub poem: Vec<StanzaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearPoemResponse {
    pub message: String,
}

/// Body of `POST /api/generate-stanza`. The field is optional on the wire so
/// that a missing value is reported as a validation error, not a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStanzaRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_contribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateStanzaResponse {
    pub stanza: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stanza: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String,
}
