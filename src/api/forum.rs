use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::JsonBody;
use super::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::db::models::{ForumComment, ForumPost, PostSummary, ReactionKind};
use crate::error::{AppError, ResultExt};
use crate::forum::toggle_reaction;

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reaction_type: ReactionKind,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub comments: Vec<ForumComment>,
}

fn require_text(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", what)));
    }
    Ok(())
}

pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let posts = state
        .db
        .list_posts(viewer)
        .await
        .context_500("Failed to load posts")?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(payload): JsonBody<NewPostRequest>,
) -> Result<Json<ForumPost>, AppError> {
    require_text(&payload.title, "Title")?;
    require_text(&payload.content, "Content")?;

    let post = state
        .db
        .create_post(user_id, payload.title.trim(), &payload.content)
        .await
        .context_500("Failed to create post")?;
    tracing::info!("User {} created forum post {}", user_id, post.id);

    Ok(Json(post))
}

pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostDetail>, AppError> {
    let post = state
        .db
        .get_post(post_id, viewer)
        .await
        .context_500("Failed to load post")?
        .ok_or(AppError::NotFound("Post"))?;

    let comments = state
        .db
        .list_comments(post_id)
        .await
        .context_500("Failed to load comments")?;

    Ok(Json(PostDetail { post, comments }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .db
        .delete_post(post_id, user_id)
        .await
        .context_500("Failed to delete post")?;
    if !deleted {
        return Err(AppError::NotFound("Post"));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(post_id): Path<Uuid>,
    JsonBody(payload): JsonBody<NewCommentRequest>,
) -> Result<Json<ForumComment>, AppError> {
    require_text(&payload.content, "Content")?;

    state
        .db
        .get_post(post_id, None)
        .await
        .context_500("Failed to post comment")?
        .ok_or(AppError::NotFound("Post"))?;

    let comment = state
        .db
        .create_comment(post_id, user_id, &payload.content)
        .await
        .context_500("Failed to post comment")?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .db
        .delete_comment(comment_id, user_id)
        .await
        .context_500("Failed to delete comment")?;
    if !deleted {
        return Err(AppError::NotFound("Comment"));
    }
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/forum/posts/:id/reactions`: like/dislike toggle.
pub async fn react(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(post_id): Path<Uuid>,
    JsonBody(payload): JsonBody<ReactionRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .db
        .get_post(post_id, None)
        .await
        .context_500("Failed to update reaction")?
        .ok_or(AppError::NotFound("Post"))?;

    let reaction = toggle_reaction(state.db.as_ref(), post_id, user_id, payload.reaction_type)
        .await
        .context_500("Failed to update reaction")?;

    Ok(Json(json!({ "reaction": reaction })))
}
