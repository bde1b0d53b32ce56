use async_trait::async_trait;
use chrono::Utc;
use domain::{
    Comment, CommentId, CommentStore, IdentityToken, LikeOutcome, LikeTransition, MediaItemId,
    NewComment,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local store. One lock covers every comment, which makes each like
/// transition trivially atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    // insertion order == creation order
    comments: Arc<Mutex<Vec<Comment>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create(&self, new: NewComment) -> anyhow::Result<Comment> {
        let now = Utc::now().naive_utc();
        let comment = Comment {
            id: CommentId::generate(),
            media_item_id: new.media_item_id,
            parent_id: new.parent_id,
            name: new.name,
            text: new.text,
            created_at: now,
            updated_at: now,
            likes: Default::default(),
        };
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }

    async fn list_by_media_item(&self, media_item_id: &MediaItemId) -> anyhow::Result<Vec<Comment>> {
        let comments = self.comments.lock().await;
        Ok(comments
            .iter()
            .rev()
            .filter(|c| &c.media_item_id == media_item_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &CommentId) -> anyhow::Result<Option<Comment>> {
        let comments = self.comments.lock().await;
        Ok(comments.iter().find(|c| &c.id == id).cloned())
    }

    async fn count_by_media_items(
        &self,
        ids: &BTreeSet<MediaItemId>,
    ) -> anyhow::Result<BTreeMap<MediaItemId, u64>> {
        let comments = self.comments.lock().await;
        let mut counts: BTreeMap<MediaItemId, u64> = ids.iter().map(|id| (id.clone(), 0)).collect();
        for c in comments.iter() {
            if let Some(n) = counts.get_mut(&c.media_item_id) {
                *n += 1;
            }
        }
        Ok(counts)
    }

    async fn apply_like(
        &self,
        id: &CommentId,
        identity: &IdentityToken,
        transition: LikeTransition,
    ) -> anyhow::Result<LikeOutcome> {
        let mut comments = self.comments.lock().await;
        let Some(comment) = comments.iter_mut().find(|c| &c.id == id) else {
            return Ok(LikeOutcome::Missing);
        };

        let outcome = comment.likes.outcome(identity, transition);
        if matches!(outcome, LikeOutcome::Applied { .. }) {
            comment.updated_at = Utc::now().naive_utc();
        }
        Ok(outcome)
    }
}
