use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::{SseDecoder, SseEvent};

/// A simple (role, content) pair for building the messages array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One call to the text-generation service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    /// Let the model consult web search before answering.
    pub web_search: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            web_search: false,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// Stream of text fragments in the order the model produced them.
pub type FragmentStream = BoxStream<'static, anyhow::Result<String>>;

/// Text-generation service. Injected into handlers so tests can substitute fakes.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Blocking completion; returns the assistant text.
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String>;

    /// Streamed completion. Resolves once the upstream accepted the request;
    /// later failures arrive as `Err` items on the stream.
    async fn stream(&self, request: CompletionRequest) -> anyhow::Result<FragmentStream>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn body(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if request.web_search {
            body["web_search_options"] = serde_json::json!({});
        }
        if stream {
            body["stream"] = serde_json::json!(true);
        }
        body
    }

    async fn send(&self, body: &serde_json::Value) -> anyhow::Result<reqwest::Response> {
        if self.api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY is not set");
        }

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, err_body);
        }

        Ok(resp)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    #[tracing::instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String> {
        let resp = self.send(&self.body(&request, false)).await?;
        let parsed: CompletionResponse = resp.json().await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(text)
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model))]
    async fn stream(&self, request: CompletionRequest) -> anyhow::Result<FragmentStream> {
        let resp = self.send(&self.body(&request, true)).await?;
        let mut bytes = Box::pin(resp.bytes_stream());

        let fragments = async_stream::try_stream! {
            let mut decoder = SseDecoder::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(anyhow::Error::from)?;
                for event in decoder.push(&chunk) {
                    match event {
                        SseEvent::Done => break 'read,
                        SseEvent::Data(data) => {
                            if let Some(text) = delta_text(&data)? {
                                yield text;
                            }
                        }
                    }
                }
            }
            if let Some(SseEvent::Data(data)) = decoder.finish() {
                if let Some(text) = delta_text(&data)? {
                    yield text;
                }
            }
        };

        Ok(fragments.boxed())
    }
}

/// Extract the non-empty text delta of one stream chunk.
fn delta_text(data: &str) -> anyhow::Result<Option<String>> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| anyhow::anyhow!("Malformed stream chunk: {}", e))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty()))
}
