use axum::extract::State;
use axum::Json;

use super::extract::JsonBody;
use super::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{NewProfile, UserProfile};
use crate::error::{AppError, ResultExt};

/// `POST /api/profile`: the sign-up step that records who the user is.
pub async fn create_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(payload): JsonBody<NewProfile>,
) -> Result<Json<UserProfile>, AppError> {
    if payload.full_name.trim().is_empty() || payload.phone_number.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Full name and phone number are required".to_string(),
        ));
    }

    let profile = state
        .db
        .create_profile(user_id, &payload)
        .await
        .context_500("Failed to create profile")?
        .ok_or_else(|| AppError::Conflict("Profile already exists".to_string()))?;
    tracing::info!("Created profile for user {}", user_id);

    Ok(Json(profile))
}

/// `GET /api/profile`
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .db
        .get_profile(user_id)
        .await
        .context_500("Failed to load profile")?
        .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(profile))
}
