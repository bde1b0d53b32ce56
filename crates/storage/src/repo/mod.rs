use async_trait::async_trait;
use domain::{
    Comment, CommentId, CommentStore, IdentityToken, LikeOutcome, LikeTransition, MediaItemId,
    NewComment,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::Db;

mod comments;
mod likes;

#[async_trait]
impl CommentStore for Db {
    async fn create(&self, new: NewComment) -> anyhow::Result<Comment> {
        self.insert_comment(new).await
    }

    async fn list_by_media_item(&self, media_item_id: &MediaItemId) -> anyhow::Result<Vec<Comment>> {
        self.list_comments(media_item_id).await
    }

    async fn find_by_id(&self, id: &CommentId) -> anyhow::Result<Option<Comment>> {
        self.get_comment(id).await
    }

    async fn count_by_media_items(
        &self,
        ids: &BTreeSet<MediaItemId>,
    ) -> anyhow::Result<BTreeMap<MediaItemId, u64>> {
        self.count_comments(ids).await
    }

    async fn apply_like(
        &self,
        id: &CommentId,
        identity: &IdentityToken,
        transition: LikeTransition,
    ) -> anyhow::Result<LikeOutcome> {
        self.apply_like_transition(id, identity, transition).await
    }
}
