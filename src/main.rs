use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use probashi_assist::ai::llm::OpenAiClient;
use probashi_assist::ai::stt::GoogleSpeechClient;
use probashi_assist::api::{self, AppState};
use probashi_assist::auth::HostedAuth;
use probashi_assist::config::AppConfig;
use probashi_assist::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting probashi-assist...");

    // Load config
    let config = AppConfig::from_env()?;
    tracing::info!(
        "Config loaded. Models: enhancer={}, answer={}, title={}",
        config.models.enhancer,
        config.models.answer,
        config.models.title
    );
    if config.openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail");
    }
    if config.speech.api_key.is_empty() {
        tracing::warn!("GOOGLE_SPEECH_API_KEY is not set; transcription will fail");
    }

    // Initialize database
    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    tracing::info!("Database connected and migrations applied.");

    // One HTTP client shared by every upstream service
    let http = reqwest::Client::new();

    let state = AppState {
        models: config.models.clone(),
        db: Arc::new(db),
        llm: Arc::new(OpenAiClient::new(
            http.clone(),
            &config.openai_api_key,
            &config.openai_base_url,
        )),
        stt: Arc::new(GoogleSpeechClient::new(http.clone(), &config.speech)),
        auth: Arc::new(HostedAuth::new(http, &config.auth_url, &config.auth_anon_key)),
    };

    let app = api::build_router(state, config.cors_origin.as_deref())?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
