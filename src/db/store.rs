use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    Conversation, ForumComment, ForumPost, Message, MessageRole, NewProfile, PostSummary,
    ReactionKind, UserProfile,
};

/// Table-level access to persisted state. `Database` is the Postgres
/// implementation; handlers only see this trait.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Conversations ──────────────────────────────────────────────

    async fn create_conversation(&self, user_id: Uuid, title: &str)
        -> anyhow::Result<Conversation>;

    async fn list_conversations(&self, user_id: Uuid) -> anyhow::Result<Vec<Conversation>>;

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>>;

    /// Removes the conversation's messages and then the conversation as one
    /// unit. Returns the number of messages removed.
    async fn delete_conversation(&self, conversation_id: Uuid, user_id: Uuid)
        -> anyhow::Result<u64>;

    // ── Messages ───────────────────────────────────────────────────

    async fn save_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message>;

    async fn get_messages(&self, conversation_id: Uuid) -> anyhow::Result<Vec<Message>>;

    // ── Profiles ───────────────────────────────────────────────────

    /// Returns `None` when the user already has a profile.
    async fn create_profile(
        &self,
        user_id: Uuid,
        profile: &NewProfile,
    ) -> anyhow::Result<Option<UserProfile>>;

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<UserProfile>>;

    // ── Forum ──────────────────────────────────────────────────────

    async fn list_posts(&self, viewer: Option<Uuid>) -> anyhow::Result<Vec<PostSummary>>;

    async fn get_post(
        &self,
        post_id: Uuid,
        viewer: Option<Uuid>,
    ) -> anyhow::Result<Option<PostSummary>>;

    async fn create_post(&self, user_id: Uuid, title: &str, content: &str)
        -> anyhow::Result<ForumPost>;

    async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<ForumComment>>;

    async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> anyhow::Result<ForumComment>;

    async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    async fn get_reaction(&self, post_id: Uuid, user_id: Uuid)
        -> anyhow::Result<Option<ReactionKind>>;

    async fn upsert_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: ReactionKind,
    ) -> anyhow::Result<()>;

    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}
