use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use super::extract::JsonBody;
use super::AppState;
use crate::chat::relay::{relay, ChatRequest};
use crate::error::AppError;

/// `POST /api/chat`: one chat turn, answered as a chunked plain-text stream.
pub async fn chat(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> Result<Response, AppError> {
    if let Some(latest) = request.messages.last() {
        tracing::info!(
            "Received message ({} turns, country: {})",
            request.messages.len(),
            request.context.country()
        );
        tracing::debug!("Latest message: {}", latest.content);
    }

    let answer = relay(state.llm.clone(), &state.models, request).await?;

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(answer),
    )
        .into_response())
}
