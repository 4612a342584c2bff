use uuid::Uuid;

use crate::db::models::ReactionKind;
use crate::db::Store;

/// Apply a like/dislike click. Clicking the reaction the user already has
/// retracts it; anything else sets it. Returns the user's reaction afterwards.
pub async fn toggle_reaction(
    store: &dyn Store,
    post_id: Uuid,
    user_id: Uuid,
    kind: ReactionKind,
) -> anyhow::Result<Option<ReactionKind>> {
    let existing = store.get_reaction(post_id, user_id).await?;

    if existing == Some(kind) {
        store.delete_reaction(post_id, user_id).await?;
        tracing::info!("User {} retracted {} on post {}", user_id, kind.as_str(), post_id);
        Ok(None)
    } else {
        store.upsert_reaction(post_id, user_id, kind).await?;
        tracing::info!("User {} set {} on post {}", user_id, kind.as_str(), post_id);
        Ok(Some(kind))
    }
}
