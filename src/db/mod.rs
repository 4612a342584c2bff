pub mod models;
pub mod store;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub use store::Store;

use models::{
    Conversation, ForumComment, ForumPost, Message, MessageRole, NewProfile, PostSummary,
    ReactionKind, UserProfile,
};

/// Post columns plus author name, reaction tallies and the viewer's reaction.
/// `$1` is the viewer id (nullable).
const POST_SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.user_id, p.created_at,
           up.full_name AS author_name,
           COUNT(r.id) FILTER (WHERE r.reaction_type = 'like') AS likes_count,
           COUNT(r.id) FILTER (WHERE r.reaction_type = 'dislike') AS dislikes_count,
           MAX(r.reaction_type) FILTER (WHERE r.user_id = $1) AS user_reaction
    FROM forum_posts p
    LEFT JOIN user_profiles up ON up.id = p.user_id
    LEFT JOIN post_reactions r ON r.post_id = p.id
"#;

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // Each CREATE TABLE must be a separate query (Postgres doesn't allow
        // multiple commands in a single prepared statement).

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS user_profiles (
                id UUID PRIMARY KEY,
                full_name TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                country_choice TEXT NOT NULL DEFAULT '',
                job_choice TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS conversations (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                title TEXT NOT NULL DEFAULT 'New Conversation',
                user_id UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS messages (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                conversation_id UUID NOT NULL REFERENCES conversations(id),
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS forum_posts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                user_id UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS forum_comments (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                post_id UUID NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                user_id UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS post_reactions (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                post_id UUID NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
                user_id UUID NOT NULL,
                reaction_type TEXT NOT NULL CHECK (reaction_type IN ('like', 'dislike')),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (post_id, user_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_conv ON messages(conversation_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id, created_at DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON forum_comments(post_id, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    // ── Conversation Operations ────────────────────────────────────

    async fn create_conversation(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> anyhow::Result<Conversation> {
        let conv = sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (user_id, title) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(conv)
    }

    async fn list_conversations(&self, user_id: Uuid) -> anyhow::Result<Vec<Conversation>> {
        let convs = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(convs)
    }

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>> {
        let conv = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conv)
    }

    async fn delete_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE conversation_id IN (
                SELECT id FROM conversations WHERE id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(conversation_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted)
    }

    // ── Message Operations ─────────────────────────────────────────

    async fn save_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message> {
        let msg = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(msg)
    }

    async fn get_messages(&self, conversation_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let msgs = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(msgs)
    }

    // ── Profile Operations ─────────────────────────────────────────

    async fn create_profile(
        &self,
        user_id: Uuid,
        profile: &NewProfile,
    ) -> anyhow::Result<Option<UserProfile>> {
        let created = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (id, full_name, phone_number, country_choice, job_choice)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&profile.full_name)
        .bind(&profile.phone_number)
        .bind(&profile.country_choice)
        .bind(&profile.job_choice)
        .fetch_optional(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    // ── Forum Operations ───────────────────────────────────────────

    async fn list_posts(&self, viewer: Option<Uuid>) -> anyhow::Result<Vec<PostSummary>> {
        let sql = format!(
            "{} GROUP BY p.id, up.full_name ORDER BY p.created_at DESC",
            POST_SUMMARY_SELECT
        );
        let posts = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn get_post(
        &self,
        post_id: Uuid,
        viewer: Option<Uuid>,
    ) -> anyhow::Result<Option<PostSummary>> {
        let sql = format!(
            "{} WHERE p.id = $2 GROUP BY p.id, up.full_name",
            POST_SUMMARY_SELECT
        );
        let post = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(viewer)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> anyhow::Result<ForumPost> {
        let post = sqlx::query_as::<_, ForumPost>(
            "INSERT INTO forum_posts (user_id, title, content) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM forum_posts WHERE id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<ForumComment>> {
        let comments = sqlx::query_as::<_, ForumComment>(
            r#"
            SELECT c.*, up.full_name AS author_name
            FROM forum_comments c
            LEFT JOIN user_profiles up ON up.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> anyhow::Result<ForumComment> {
        let comment = sqlx::query_as::<_, ForumComment>(
            r#"
            WITH c AS (
                INSERT INTO forum_comments (post_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT c.*, up.full_name AS author_name
            FROM c
            LEFT JOIN user_profiles up ON up.id = c.user_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM forum_comments WHERE id = $1 AND user_id = $2")
            .bind(comment_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<ReactionKind>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT reaction_type FROM post_reactions WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(kind,)| ReactionKind::parse(&kind)))
    }

    async fn upsert_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: ReactionKind,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_reactions (post_id, user_id, reaction_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, user_id) DO UPDATE SET reaction_type = EXCLUDED.reaction_type
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
