use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::enhance::{answer_prompt, enhance, Enhancement, UserContext};
use crate::ai::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::config::ModelConfig;
use crate::db::models::MessageRole;
use crate::error::{AppError, ResultExt};

/// Fragments buffered between the upstream reader and the HTTP body.
const RELAY_BUFFER: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

/// Body of a chat turn request: the running transcript plus user context.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
    #[serde(flatten)]
    pub context: UserContext,
}

/// Receiving end of a relayed answer. Yields fragments in upstream order;
/// an `Err` item means the upstream broke off mid-answer.
pub type AnswerStream = ReceiverStream<anyhow::Result<String>>;

/// Build the message list for the answering model: the system instruction,
/// then the history with its last user turn replaced by the enhanced text.
pub async fn prepare_messages(
    model: &dyn ChatModel,
    models: &ModelConfig,
    request: &ChatRequest,
) -> Result<Vec<ChatMessage>, AppError> {
    let Some(latest) = request.messages.last() else {
        return Err(AppError::BadRequest("messages must not be empty".to_string()));
    };

    let mut turns: Vec<ChatMessage> = request
        .messages
        .iter()
        .map(|t| ChatMessage {
            role: t.role.as_str().to_string(),
            content: t.content.clone(),
        })
        .collect();

    if latest.role == MessageRole::User {
        let enhancement = enhance(model, &models.enhancer, &request.context, &latest.content).await;
        match &enhancement {
            Enhancement::Rewritten(text) => tracing::debug!("Enhanced prompt: {}", text),
            Enhancement::Fallback { reason, .. } => {
                tracing::warn!("Prompt enhancement failed, using original message: {}", reason)
            }
        }
        if let Some(last) = turns.last_mut() {
            last.content = enhancement.into_content();
        }
    }

    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ChatMessage::system(answer_prompt(&request.context)));
    messages.extend(turns);
    Ok(messages)
}

/// Enhance the latest turn, open the streamed answer and forward its
/// fragments through a channel as they arrive.
///
/// Errors before the upstream accepts the request are returned directly;
/// anything later is delivered on the stream.
pub async fn relay(
    model: Arc<dyn ChatModel>,
    models: &ModelConfig,
    request: ChatRequest,
) -> Result<AnswerStream, AppError> {
    let messages = prepare_messages(model.as_ref(), models, &request).await?;

    let upstream = model
        .stream(CompletionRequest::new(models.answer.clone(), messages).with_web_search())
        .await
        .context_500("Failed to process chat request")?;

    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    tokio::spawn(forward(upstream, tx));

    Ok(ReceiverStream::new(rx))
}

async fn forward(
    mut upstream: crate::ai::llm::FragmentStream,
    tx: mpsc::Sender<anyhow::Result<String>>,
) {
    let mut sent = 0usize;
    while let Some(item) = upstream.next().await {
        match item {
            Ok(fragment) if fragment.is_empty() => continue,
            Ok(fragment) => {
                sent += fragment.len();
                if tx.send(Ok(fragment)).await.is_err() {
                    tracing::debug!("Client went away after {} bytes, stopping relay", sent);
                    return;
                }
            }
            Err(e) => {
                tracing::error!("Error in answer stream after {} bytes: {:#}", sent, e);
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
    tracing::info!("Answer stream finished ({} bytes)", sent);
}
