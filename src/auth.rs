//! Caller identity. Sign-up, login and sessions live with the hosted auth
//! provider; this service only resolves a bearer token to a user id.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{AppError, ResultExt};

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` means the token was rejected.
    async fn user_for_token(&self, token: &str) -> anyhow::Result<Option<Uuid>>;
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

/// Validates access tokens against the provider's `/auth/v1/user` endpoint.
pub struct HostedAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl HostedAuth {
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl Authenticator for HostedAuth {
    async fn user_for_token(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        if self.base_url.is_empty() {
            anyhow::bail!("AUTH_URL is not set");
        }

        let resp = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {
                let user: AuthUser = resp.json().await?;
                Ok(Some(user.id))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let err_body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Auth provider error ({}): {}", status, err_body)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<Uuid>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };
    state
        .auth
        .user_for_token(token)
        .await
        .context_500("Failed to verify session")
}

/// A signed-in caller. Rejects with 401 when there is none.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// The caller's id when signed in; anonymous requests pass through.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}
