use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Single allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,

    /// OpenAI key. Left empty when unset so calls fail instead of start-up.
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub models: ModelConfig,

    pub speech: SpeechConfig,

    /// Base URL of the hosted auth provider
    pub auth_url: String,
    pub auth_anon_key: String,
}

/// Model names used for each upstream call of a chat turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub enhancer: String,
    pub answer: String,
    pub title: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enhancer: "gpt-4o-mini".to_string(),
            answer: "gpt-4o-search-preview".to_string(),
            title: "gpt-4.1-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub sample_rate_hertz: u32,
    pub encoding: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://speech.googleapis.com".to_string(),
            language: "bn-BD".to_string(),
            sample_rate_hertz: 48_000,
            encoding: "WEBM_OPUS".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let model_defaults = ModelConfig::default();
        let speech_defaults = SpeechConfig::default();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            models: ModelConfig {
                enhancer: std::env::var("ENHANCER_MODEL").unwrap_or(model_defaults.enhancer),
                answer: std::env::var("ANSWER_MODEL").unwrap_or(model_defaults.answer),
                title: std::env::var("TITLE_MODEL").unwrap_or(model_defaults.title),
            },
            speech: SpeechConfig {
                api_key: std::env::var("GOOGLE_SPEECH_API_KEY").unwrap_or_default(),
                base_url: std::env::var("SPEECH_BASE_URL").unwrap_or(speech_defaults.base_url),
                language: std::env::var("SPEECH_LANGUAGE").unwrap_or(speech_defaults.language),
                ..speech_defaults
            },
            auth_url: std::env::var("AUTH_URL").unwrap_or_default(),
            auth_anon_key: std::env::var("AUTH_ANON_KEY").unwrap_or_default(),
        })
    }
}
