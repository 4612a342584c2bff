//! In-memory fakes for the injected services, plus a router wired to them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::HeaderValue;
use axum_test::{TestRequest, TestServer};
use chrono::Utc;
use futures::StreamExt;
use uuid::Uuid;

use probashi_assist::ai::llm::{ChatModel, CompletionRequest, FragmentStream};
use probashi_assist::ai::stt::Transcriber;
use probashi_assist::api::{build_router, AppState};
use probashi_assist::auth::Authenticator;
use probashi_assist::config::ModelConfig;
use probashi_assist::db::models::{
    Conversation, ForumComment, ForumPost, Message, MessageRole, NewProfile, PostReaction,
    PostSummary, ReactionKind, UserProfile,
};
use probashi_assist::db::Store;

// ── Store ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Tables {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub profiles: Vec<UserProfile>,
    pub posts: Vec<ForumPost>,
    pub comments: Vec<ForumComment>,
    pub reactions: Vec<PostReaction>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub tables: Mutex<Tables>,
}

impl MemoryStore {
    fn summarize(tables: &Tables, post: &ForumPost, viewer: Option<Uuid>) -> PostSummary {
        let reactions: Vec<&PostReaction> = tables
            .reactions
            .iter()
            .filter(|r| r.post_id == post.id)
            .collect();
        let count = |kind: &str| reactions.iter().filter(|r| r.reaction_type == kind).count() as i64;

        PostSummary {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
            created_at: post.created_at,
            author_name: Self::author(tables, post.user_id),
            likes_count: count("like"),
            dislikes_count: count("dislike"),
            user_reaction: viewer.and_then(|v| {
                reactions
                    .iter()
                    .find(|r| r.user_id == v)
                    .map(|r| r.reaction_type.clone())
            }),
        }
    }

    fn author(tables: &Tables, user_id: Uuid) -> Option<String> {
        tables
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .map(|p| p.full_name.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_conversation(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> anyhow::Result<Conversation> {
        let conv = Conversation {
            id: Uuid::new_v4(),
            title: title.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().conversations.push(conv.clone());
        Ok(conv)
    }

    async fn list_conversations(&self, user_id: Uuid) -> anyhow::Result<Vec<Conversation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .conversations
            .iter()
            .find(|c| c.id == conversation_id && c.user_id == user_id)
            .cloned())
    }

    async fn delete_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let owned = tables
            .conversations
            .iter()
            .any(|c| c.id == conversation_id && c.user_id == user_id);
        if !owned {
            return Ok(0);
        }
        let before = tables.messages.len();
        tables.messages.retain(|m| m.conversation_id != conversation_id);
        let removed = (before - tables.messages.len()) as u64;
        tables.conversations.retain(|c| c.id != conversation_id);
        Ok(removed)
    }

    async fn save_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.conversations.iter().any(|c| c.id == conversation_id) {
            anyhow::bail!("foreign key violation: conversation {}", conversation_id);
        }
        let msg = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: role.as_str().to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.messages.push(msg.clone());
        Ok(msg)
    }

    async fn get_messages(&self, conversation_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn create_profile(
        &self,
        user_id: Uuid,
        profile: &NewProfile,
    ) -> anyhow::Result<Option<UserProfile>> {
        let mut tables = self.tables.lock().unwrap();
        if tables.profiles.iter().any(|p| p.id == user_id) {
            return Ok(None);
        }
        let created = UserProfile {
            id: user_id,
            full_name: profile.full_name.clone(),
            phone_number: profile.phone_number.clone(),
            country_choice: profile.country_choice.clone(),
            job_choice: profile.job_choice.clone(),
            created_at: Utc::now(),
        };
        tables.profiles.push(created.clone());
        Ok(Some(created))
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn list_posts(&self, viewer: Option<Uuid>) -> anyhow::Result<Vec<PostSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .rev()
            .map(|p| Self::summarize(&tables, p, viewer))
            .collect())
    }

    async fn get_post(
        &self,
        post_id: Uuid,
        viewer: Option<Uuid>,
    ) -> anyhow::Result<Option<PostSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| Self::summarize(&tables, p, viewer)))
    }

    async fn create_post(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> anyhow::Result<ForumPost> {
        let post = ForumPost {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.posts.len();
        tables
            .posts
            .retain(|p| !(p.id == post_id && p.user_id == user_id));
        let deleted = tables.posts.len() < before;
        if deleted {
            tables.comments.retain(|c| c.post_id != post_id);
            tables.reactions.retain(|r| r.post_id != post_id);
        }
        Ok(deleted)
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<ForumComment>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> anyhow::Result<ForumComment> {
        let mut tables = self.tables.lock().unwrap();
        let comment = ForumComment {
            id: Uuid::new_v4(),
            post_id,
            content: content.to_string(),
            user_id,
            created_at: Utc::now(),
            author_name: Self::author(&tables, user_id),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.comments.len();
        tables
            .comments
            .retain(|c| !(c.id == comment_id && c.user_id == user_id));
        Ok(tables.comments.len() < before)
    }

    async fn get_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<ReactionKind>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reactions
            .iter()
            .find(|r| r.post_id == post_id && r.user_id == user_id)
            .and_then(|r| ReactionKind::parse(&r.reaction_type)))
    }

    async fn upsert_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: ReactionKind,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .reactions
            .iter_mut()
            .find(|r| r.post_id == post_id && r.user_id == user_id)
        {
            existing.reaction_type = kind.as_str().to_string();
            return Ok(());
        }
        tables.reactions.push(PostReaction {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            reaction_type: kind.as_str().to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.reactions.len();
        tables
            .reactions
            .retain(|r| !(r.post_id == post_id && r.user_id == user_id));
        Ok(tables.reactions.len() < before)
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// `complete` answers with `completion` (or fails when `None`); `stream`
/// replays `fragments`, or refuses to open when `stream_fails` is set.
/// Every request is recorded.
#[derive(Default)]
pub struct FakeModel {
    pub completion: Option<String>,
    pub fragments: Vec<String>,
    pub stream_fails: bool,
    pub completions: Mutex<Vec<CompletionRequest>>,
    pub streams: Mutex<Vec<CompletionRequest>>,
}

impl FakeModel {
    pub fn new(completion: Option<&str>, fragments: &[&str]) -> Self {
        Self {
            completion: completion.map(str::to_string),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String> {
        self.completions.lock().unwrap().push(request);
        self.completion
            .clone()
            .ok_or_else(|| anyhow::anyhow!("model unavailable"))
    }

    async fn stream(&self, request: CompletionRequest) -> anyhow::Result<FragmentStream> {
        self.streams.lock().unwrap().push(request);
        if self.stream_fails {
            anyhow::bail!("OpenAI API error (503 Service Unavailable): overloaded");
        }
        let items: Vec<anyhow::Result<String>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(futures::stream::iter(items).boxed())
    }
}

// ── Transcriber ────────────────────────────────────────────────────

pub struct FakeTranscriber {
    pub text: Option<String>,
    pub received: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String> {
        self.received.lock().unwrap().push(audio.to_vec());
        self.text
            .clone()
            .ok_or_else(|| anyhow::anyhow!("speech service unavailable"))
    }
}

// ── Auth ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct TokenAuth {
    pub tokens: HashMap<String, Uuid>,
}

#[async_trait]
impl Authenticator for TokenAuth {
    async fn user_for_token(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        Ok(self.tokens.get(token).copied())
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

pub struct Harness {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub model: Arc<FakeModel>,
    pub stt: Arc<FakeTranscriber>,
    pub alice: Uuid,
    pub bob: Uuid,
}

pub fn harness(model: FakeModel) -> Harness {
    harness_with(model, Some("আমি কাতারে যেতে চাই"))
}

pub fn harness_with(model: FakeModel, transcript: Option<&str>) -> Harness {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let auth = TokenAuth {
        tokens: HashMap::from([
            (ALICE_TOKEN.to_string(), alice),
            (BOB_TOKEN.to_string(), bob),
        ]),
    };

    let store = Arc::new(MemoryStore::default());
    let model = Arc::new(model);
    let stt = Arc::new(FakeTranscriber {
        text: transcript.map(str::to_string),
        received: Mutex::new(Vec::new()),
    });

    let state = AppState {
        models: ModelConfig::default(),
        db: store.clone(),
        llm: model.clone(),
        stt: stt.clone(),
        auth: Arc::new(auth),
    };
    let app = build_router(state, None).expect("router");
    let server = TestServer::new(app).expect("test server");

    Harness {
        server,
        store,
        model,
        stt,
        alice,
        bob,
    }
}

/// Attach `token` as the caller's bearer credentials.
pub fn as_user(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value"),
    )
}
