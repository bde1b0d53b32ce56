use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::CommentError;
use crate::identity::IdentityToken;
use crate::ledger::{LikeOutcome, LikeTransition};
use crate::models::{
    Comment, CommentId, CommentView, MediaItemId, NewComment, MAX_NAME_CHARS, MAX_TEXT_CHARS,
};
use crate::store::CommentStore;
use crate::tree::{CommentTree, Thread};

/// Raw post request as it arrives from the outer surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentInput {
    pub media_item_id: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub parent_id: Option<String>,
}

/// Comment operations exposed to the API layer.
///
/// Identity is always handed in by the caller; nothing here reads requests.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    pub async fn post_comment(&self, input: PostCommentInput) -> Result<Comment, CommentError> {
        let new = validate_post(input)?;
        debug!(
            "Posting comment on media item {} (reply: {})",
            new.media_item_id,
            new.parent_id.is_some()
        );
        self.store.create(new).await.map_err(store_failure)
    }

    pub async fn list_comments(
        &self,
        media_item_id: Option<&str>,
        requester: &IdentityToken,
    ) -> Result<Vec<CommentView>, CommentError> {
        let media_item_id = require_media_item(media_item_id)?;
        let comments = self
            .store
            .list_by_media_item(&media_item_id)
            .await
            .map_err(store_failure)?;

        Ok(comments.iter().map(|c| c.view_for(requester)).collect())
    }

    /// Display-ready threads. Built on request only, never on plain reads.
    pub async fn comment_threads(
        &self,
        media_item_id: Option<&str>,
        requester: &IdentityToken,
    ) -> Result<Vec<Thread<CommentView>>, CommentError> {
        let flat = self.list_comments(media_item_id, requester).await?;
        Ok(CommentTree::build(flat).into_threads())
    }

    pub async fn like(
        &self,
        comment_id: &str,
        requester: &IdentityToken,
    ) -> Result<u64, CommentError> {
        self.transition(comment_id, requester, LikeTransition::Like)
            .await
    }

    pub async fn unlike(
        &self,
        comment_id: &str,
        requester: &IdentityToken,
    ) -> Result<u64, CommentError> {
        self.transition(comment_id, requester, LikeTransition::Unlike)
            .await
    }

    /// Every requested id is echoed back. Malformed ids never reach the
    /// store and report 0.
    pub async fn count_for_media_items<I, S>(
        &self,
        ids: Option<I>,
    ) -> Result<BTreeMap<String, u64>, CommentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids.ok_or_else(|| CommentError::Validation("mediaItemIds is required".into()))?;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut parsed: BTreeSet<MediaItemId> = BTreeSet::new();
        for raw in ids {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            counts.insert(raw.to_string(), 0);
            match MediaItemId::new(raw) {
                Ok(id) => {
                    parsed.insert(id);
                }
                Err(e) => debug!("Not querying media item id {:?}: {}", raw, e),
            }
        }

        if parsed.is_empty() {
            return Ok(counts);
        }

        let stored = self
            .store
            .count_by_media_items(&parsed)
            .await
            .map_err(store_failure)?;
        for (id, n) in stored {
            counts.insert(id.as_str().to_string(), n);
        }
        Ok(counts)
    }

    async fn transition(
        &self,
        comment_id: &str,
        requester: &IdentityToken,
        transition: LikeTransition,
    ) -> Result<u64, CommentError> {
        let id = CommentId::parse(comment_id).map_err(CommentError::InvalidId)?;

        let outcome = self
            .store
            .apply_like(&id, requester, transition)
            .await
            .map_err(store_failure)?;

        match outcome {
            LikeOutcome::Applied { likes_count } => {
                debug!("{:?} on comment {} -> {}", transition, id, likes_count);
                Ok(likes_count)
            }
            LikeOutcome::AlreadyLiked { likes_count } => {
                warn!("Duplicate like on comment {}", id);
                Err(CommentError::AlreadyLiked { likes_count })
            }
            LikeOutcome::NotLiked { likes_count } => {
                warn!("Unlike without a like on comment {}", id);
                Err(CommentError::NotLiked { likes_count })
            }
            LikeOutcome::Missing => Err(CommentError::NotFound),
        }
    }
}

fn store_failure(e: anyhow::Error) -> CommentError {
    error!("Comment store error: {:?}", e);
    CommentError::StoreUnavailable(e)
}

fn require_media_item(raw: Option<&str>) -> Result<MediaItemId, CommentError> {
    let raw = raw.ok_or_else(|| CommentError::Validation("mediaItemId is required".into()))?;
    MediaItemId::new(raw).map_err(CommentError::Validation)
}

fn validate_post(input: PostCommentInput) -> Result<NewComment, CommentError> {
    let media_item_id = require_media_item(input.media_item_id.as_deref())?;

    let text = input.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(CommentError::Validation("text is required".into()));
    }
    if text.contains('\0') {
        return Err(CommentError::Validation("text must not contain NUL characters".into()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(CommentError::Validation(format!(
            "Comment exceeds the maximum of {} characters",
            MAX_TEXT_CHARS
        )));
    }

    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(ref n) = name {
        if n.contains('\0') {
            return Err(CommentError::Validation("name must not contain NUL characters".into()));
        }
        if n.chars().count() > MAX_NAME_CHARS {
            return Err(CommentError::Validation(format!(
                "Name exceeds the maximum of {} characters",
                MAX_NAME_CHARS
            )));
        }
    }

    // Existence is not checked: replies to unknown parents render as roots.
    let parent_id = match input.parent_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(CommentId::parse(raw).map_err(CommentError::Validation)?),
    };

    Ok(NewComment {
        media_item_id,
        parent_id,
        name,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> PostCommentInput {
        PostCommentInput {
            media_item_id: Some("m1".into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    #[test]
    fn text_length_boundary() {
        assert!(validate_post(input(&"a".repeat(MAX_TEXT_CHARS))).is_ok());
        assert!(matches!(
            validate_post(input(&"a".repeat(MAX_TEXT_CHARS + 1))),
            Err(CommentError::Validation(_))
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_post(input(&"é".repeat(MAX_TEXT_CHARS))).is_ok());
    }

    #[test]
    fn blank_text_rejected() {
        assert!(matches!(validate_post(input("")), Err(CommentError::Validation(_))));
        assert!(matches!(
            validate_post(input(" \n\t ")),
            Err(CommentError::Validation(_))
        ));
        let missing = PostCommentInput {
            media_item_id: Some("m1".into()),
            ..Default::default()
        };
        assert!(matches!(validate_post(missing), Err(CommentError::Validation(_))));
    }

    #[test]
    fn nul_characters_rejected() {
        assert!(matches!(
            validate_post(input("\0abc")),
            Err(CommentError::Validation(_))
        ));

        let mut req = input("hello");
        req.name = Some("Fer\0ris".into());
        assert!(matches!(validate_post(req), Err(CommentError::Validation(_))));

        // other control characters are ordinary text
        assert!(validate_post(input("line one\nline two\t!")).is_ok());
    }

    #[test]
    fn media_item_required() {
        let mut req = input("hello");
        req.media_item_id = None;
        assert!(matches!(validate_post(req), Err(CommentError::Validation(_))));
    }

    #[test]
    fn blank_name_is_anonymous_and_long_name_rejected() {
        let mut req = input("hello");
        req.name = Some("   ".into());
        assert_eq!(validate_post(req).unwrap().name, None);

        let mut req = input("hello");
        req.name = Some("n".repeat(MAX_NAME_CHARS + 1));
        assert!(matches!(validate_post(req), Err(CommentError::Validation(_))));
    }

    #[test]
    fn parent_must_be_well_formed_but_need_not_exist() {
        let mut req = input("reply");
        req.parent_id = Some("0123456789abcdef01234567".into());
        assert!(validate_post(req).unwrap().parent_id.is_some());

        let mut req = input("reply");
        req.parent_id = Some("nope".into());
        assert!(matches!(validate_post(req), Err(CommentError::Validation(_))));
    }
}
