use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::config::SpeechConfig;

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one recorded clip to text.
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String>;
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

/// Client for the hosted Google Cloud Speech-to-Text `recognize` endpoint.
pub struct GoogleSpeechClient {
    client: Client,
    config: SpeechConfig,
}

impl GoogleSpeechClient {
    pub fn new(client: Client, config: &SpeechConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechClient {
    #[tracing::instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String> {
        if self.config.api_key.is_empty() {
            anyhow::bail!("GOOGLE_SPEECH_API_KEY is not set");
        }

        let body = serde_json::json!({
            "audio": {
                "content": base64::engine::general_purpose::STANDARD.encode(audio),
            },
            "config": {
                "encoding": self.config.encoding,
                "sampleRateHertz": self.config.sample_rate_hertz,
                "languageCode": self.config.language,
                "model": "default",
            },
        });

        let resp = self
            .client
            .post(format!(
                "{}/v1/speech:recognize",
                self.config.base_url.trim_end_matches('/')
            ))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Speech API error ({}): {}", status, err_body);
        }

        let parsed: RecognizeResponse = resp.json().await?;
        Ok(join_transcripts(parsed))
    }
}

/// First alternative of each recognized segment, one per line. A segment
/// without alternatives still takes its line.
fn join_transcripts(response: RecognizeResponse) -> String {
    response
        .results
        .into_iter()
        .map(|r| {
            r.alternatives
                .into_iter()
                .next()
                .map(|alt| alt.transcript)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
