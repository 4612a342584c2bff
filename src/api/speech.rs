use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{AppError, ResultExt};

/// `POST /api/speech-to-text`: multipart upload with an `audio` field.
pub async fn speech_to_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() == Some("audio") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?;
            audio = Some(bytes);
            break;
        }
    }

    let audio = audio
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("No audio file provided".to_string()))?;

    let text = state
        .stt
        .transcribe(&audio)
        .await
        .context_500("Failed to convert speech to text")?;
    tracing::info!("Transcribed {} bytes of audio into {} chars", audio.len(), text.chars().count());

    Ok(Json(json!({ "text": text })))
}
