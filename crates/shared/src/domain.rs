use serde::{Deserialize, Serialize};

/// One unit of the poem: the stanza text and, once illustrated, its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StanzaEntry {
    pub stanza: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl StanzaEntry {
    pub fn new(stanza: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            stanza: stanza.into(),
            image_url,
        }
    }

    pub fn illustrated(stanza: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self::new(stanza, Some(image_url.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_is_camel_case_on_the_wire() {
        let entry = StanzaEntry::illustrated("The moon rose", "https://img/1.png");
        let json = serde_json::to_value(&entry).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "stanza": "The moon rose", "imageUrl": "https://img/1.png" })
        );
    }

    #[test]
    fn absent_image_url_is_omitted_and_tolerated() {
        let entry = StanzaEntry::new("text only", None);
        let json = serde_json::to_string(&entry).expect("json");
        assert_eq!(json, r#"{"stanza":"text only"}"#);

        let parsed: StanzaEntry = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, entry);
    }
}
