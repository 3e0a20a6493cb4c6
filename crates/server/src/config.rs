use std::{collections::HashMap, fs};

use ai_integration::CompletionOptions;
use anyhow::bail;
use server_api::GenerationSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub completion_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub image_size: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:4000".into(),
            openai_api_key: None,
            openai_base_url: None,
            completion_model: "gpt-3.5-turbo".into(),
            max_tokens: 100,
            temperature: 0.7,
            image_size: "512x512".into(),
        }
    }
}

impl Settings {
    pub fn require_api_key(&self) -> anyhow::Result<&str> {
        match self.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => bail!("OPENAI_API_KEY is missing; set it in the environment or a .env file"),
        }
    }

    pub fn generation(&self) -> GenerationSettings {
        GenerationSettings {
            completion: CompletionOptions {
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            },
            image_size: self.image_size.clone(),
        }
    }
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string("server.toml")
        .ok()
        .and_then(|raw| toml::from_str::<HashMap<String, String>>(&raw).ok())
        .unwrap_or_default();

    apply_overrides(Settings::default(), &file_cfg, |key| std::env::var(key).ok())
}

pub(crate) fn apply_overrides(
    mut settings: Settings,
    file_cfg: &HashMap<String, String>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("openai_base_url") {
        settings.openai_base_url = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("completion_model") {
        settings.completion_model = v.clone();
    }
    if let Some(v) = file_cfg.get("image_size") {
        settings.image_size = v.clone();
    }

    if let Some(port) = env("PORT").and_then(|v| v.parse::<u16>().ok()) {
        settings.server_bind = with_port(&settings.server_bind, port);
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }
    if let Some(v) = env("APP__OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }
    if let Some(v) = env("OPENAI_BASE_URL") {
        settings.openai_base_url = Some(v);
    }

    if let Some(v) = env("APP__COMPLETION_MODEL") {
        settings.completion_model = v;
    }
    if let Some(parsed) = env("APP__MAX_TOKENS").and_then(|v| v.parse::<u32>().ok()) {
        settings.max_tokens = parsed;
    }
    if let Some(parsed) = env("APP__TEMPERATURE").and_then(|v| v.parse::<f32>().ok()) {
        settings.temperature = parsed;
    }
    if let Some(v) = env("APP__IMAGE_SIZE") {
        settings.image_size = v;
    }

    settings
}

fn with_port(bind: &str, port: u16) -> String {
    let host = bind.rsplit_once(':').map_or(bind, |(host, _)| host);
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_match_the_stock_deployment() {
        let settings = apply_overrides(Settings::default(), &HashMap::new(), env_from(&[]));
        assert_eq!(settings.server_bind, "127.0.0.1:4000");
        assert_eq!(settings.completion_model, "gpt-3.5-turbo");
        assert_eq!(settings.max_tokens, 100);
        assert_eq!(settings.image_size, "512x512");
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn port_replaces_only_the_port() {
        let settings = apply_overrides(
            Settings::default(),
            &HashMap::new(),
            env_from(&[("PORT", "5050")]),
        );
        assert_eq!(settings.server_bind, "127.0.0.1:5050");
    }

    #[test]
    fn env_wins_over_file() {
        let file_cfg = HashMap::from([
            ("bind_addr".to_string(), "0.0.0.0:9000".to_string()),
            ("completion_model".to_string(), "from-file".to_string()),
        ]);
        let settings = apply_overrides(
            Settings::default(),
            &file_cfg,
            env_from(&[("APP__COMPLETION_MODEL", "from-env")]),
        );
        assert_eq!(settings.server_bind, "0.0.0.0:9000");
        assert_eq!(settings.completion_model, "from-env");
    }

    #[test]
    fn unparseable_numbers_keep_defaults() {
        let settings = apply_overrides(
            Settings::default(),
            &HashMap::new(),
            env_from(&[("APP__MAX_TOKENS", "lots"), ("APP__TEMPERATURE", "warm")]),
        );
        assert_eq!(settings.max_tokens, 100);
        assert_eq!(settings.temperature, 0.7);
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let mut settings = Settings::default();
        assert!(settings.require_api_key().is_err());

        settings.openai_api_key = Some("  ".into());
        assert!(settings.require_api_key().is_err());

        settings.openai_api_key = Some("sk-live".into());
        assert_eq!(settings.require_api_key().expect("key"), "sk-live");
    }

    #[test]
    fn generation_settings_follow_config() {
        let settings = apply_overrides(
            Settings::default(),
            &HashMap::new(),
            env_from(&[("APP__MAX_TOKENS", "60"), ("APP__IMAGE_SIZE", "256x256")]),
        );
        let generation = settings.generation();
        assert_eq!(generation.completion.max_tokens, 60);
        assert_eq!(generation.image_size, "256x256");
    }
}
