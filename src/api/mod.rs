pub mod chat;
pub mod conversations;
pub mod extract;
pub mod forum;
pub mod health;
pub mod profile;
pub mod speech;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ai::{llm::ChatModel, stt::Transcriber};
use crate::auth::Authenticator;
use crate::config::ModelConfig;
use crate::db::Store;

/// Shared application state, accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub models: ModelConfig,
    pub db: Arc<dyn Store>,
    pub llm: Arc<dyn ChatModel>,
    pub stt: Arc<dyn Transcriber>,
    pub auth: Arc<dyn Authenticator>,
}

/// Build the HTTP router.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> anyhow::Result<Router> {
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Chat turn and conversation lifecycle
        .route("/chat", post(chat::chat))
        .route("/chat/delete", delete(conversations::delete_conversation))
        .route("/create-chat", post(conversations::create_conversation))
        .route("/speech-to-text", post(speech::speech_to_text))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/:id", get(conversations::get_conversation))
        .route("/conversations/:id/messages", post(conversations::append_message))
        // Profiles
        .route("/profile", get(profile::get_profile).post(profile::create_profile))
        // Forum
        .route("/forum/posts", get(forum::list_posts).post(forum::create_post))
        .route("/forum/posts/:id", get(forum::get_post).delete(forum::delete_post))
        .route("/forum/posts/:id/comments", post(forum::create_comment))
        .route("/forum/posts/:id/reactions", post(forum::react))
        .route("/forum/comments/:id", delete(forum::delete_comment))
}
