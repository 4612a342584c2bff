use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::JsonBody;
use super::AppState;
use crate::auth::CurrentUser;
use crate::chat::relay::Turn;
use crate::chat::title::generate_title;
use crate::db::models::{Conversation, Message, MessageRole};
use crate::error::{AppError, ResultExt};

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationResponse {
    pub conversation_id: Uuid,
}

/// `POST /api/create-chat`: title the conversation from its first message and store it.
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(payload): JsonBody<CreateConversationRequest>,
) -> Result<Json<CreateConversationResponse>, AppError> {
    let first_message = payload
        .messages
        .first()
        .map(|t| t.content.as_str())
        .unwrap_or_default();

    let title = generate_title(state.llm.as_ref(), &state.models.title, first_message).await;

    let conv = state
        .db
        .create_conversation(user_id, &title)
        .await
        .context_500("Failed to process request")?;
    tracing::info!("Created conversation {} for user {}: {}", conv.id, user_id, conv.title);

    Ok(Json(CreateConversationResponse {
        conversation_id: conv.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// `DELETE /api/chat/delete?id=...`: remove a conversation and its messages.
pub async fn delete_conversation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, AppError> {
    let raw_id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Conversation ID is required".to_string()))?;
    let conv_id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::BadRequest("Conversation ID is invalid".to_string()))?;

    let deleted = state
        .db
        .delete_conversation(conv_id, user_id)
        .await
        .context_500("Failed to delete conversation")?;
    tracing::info!("Deleted conversation {} ({} messages)", conv_id, deleted);

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/conversations`: the caller's conversations, newest first.
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let convs = state
        .db
        .list_conversations(user_id)
        .await
        .context_500("Failed to load conversations")?;
    Ok(Json(convs))
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// `GET /api/conversations/:id`: title plus transcript in creation order.
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(conv_id): Path<Uuid>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conversation = state
        .db
        .get_conversation(conv_id, user_id)
        .await
        .context_500("Failed to load conversation")?
        .ok_or(AppError::NotFound("Conversation"))?;

    let messages = state
        .db
        .get_messages(conv_id)
        .await
        .context_500("Failed to load conversation")?;

    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub role: MessageRole,
    pub content: String,
}

/// `POST /api/conversations/:id/messages`: store one finished turn.
pub async fn append_message(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(conv_id): Path<Uuid>,
    JsonBody(payload): JsonBody<AppendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    state
        .db
        .get_conversation(conv_id, user_id)
        .await
        .context_500("Failed to save message")?
        .ok_or(AppError::NotFound("Conversation"))?;

    let msg = state
        .db
        .save_message(conv_id, payload.role, &payload.content)
        .await
        .context_500("Failed to save message")?;

    Ok(Json(msg))
}
