use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::identity::IdentityToken;
use crate::ledger::{LikeOutcome, LikeTransition};
use crate::models::{Comment, CommentId, MediaItemId, NewComment};

/// Persistence contract for comment records.
///
/// Implementations own all comment state. Length and parent checks are the
/// caller's job; `create` stores what it is given.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, new: NewComment) -> Result<Comment>;

    /// All comments of one media item, every depth, newest first.
    async fn list_by_media_item(&self, media_item_id: &MediaItemId) -> Result<Vec<Comment>>;

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>>;

    /// Every requested id appears in the result, zero when it has no comments.
    async fn count_by_media_items(
        &self,
        ids: &BTreeSet<MediaItemId>,
    ) -> Result<BTreeMap<MediaItemId, u64>>;

    /// Moves one identity's like state on one comment as a single atomic
    /// conditional update. A rejected transition mutates nothing.
    async fn apply_like(
        &self,
        id: &CommentId,
        identity: &IdentityToken,
        transition: LikeTransition,
    ) -> Result<LikeOutcome>;
}
