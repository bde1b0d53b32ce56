use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::IdentityToken;
use crate::ledger::LikeLedger;

pub const MAX_TEXT_CHARS: usize = 500;
pub const MAX_NAME_CHARS: usize = 100;
pub const ANONYMOUS_NAME: &str = "Anonymous";

const MAX_MEDIA_ITEM_ID_LEN: usize = 64;
const COMMENT_ID_BYTES: usize = 12;

/// Reference to a media item owned by the catalog. Never resolved here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaItemId(String);

impl MediaItemId {
    pub fn new(s: impl AsRef<str>) -> Result<Self, String> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err("mediaItemId is required".to_string());
        }
        if s.len() > MAX_MEDIA_ITEM_ID_LEN {
            return Err(format!(
                "mediaItemId is too long (max {} chars)",
                MAX_MEDIA_ITEM_ID_LEN
            ));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err("mediaItemId contains invalid characters".to_string());
        }
        Ok(Self(s.to_string()))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned comment id: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        let bytes: [u8; COMMENT_ID_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        let well_formed = s.len() == COMMENT_ID_BYTES * 2
            && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !well_formed {
            return Err(format!("Invalid comment id: {}", s));
        }
        Ok(Self(s.to_string()))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated input for `CommentStore::create`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub media_item_id: MediaItemId,
    pub parent_id: Option<CommentId>,
    pub name: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub media_item_id: MediaItemId,
    pub parent_id: Option<CommentId>,
    pub name: Option<String>,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub likes: LikeLedger,
}

impl Comment {
    pub fn likes_count(&self) -> u64 {
        self.likes.count()
    }

    /// Public projection for one requester. The ledger itself is never serialized.
    pub fn view_for(&self, requester: &IdentityToken) -> CommentView {
        CommentView {
            id: self.id.clone(),
            media_item_id: self.media_item_id.clone(),
            parent_id: self.parent_id.clone(),
            name: self.name.clone(),
            text: self.text.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            likes_count: self.likes_count(),
            liked_by_me: self.likes.contains(requester),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub media_item_id: MediaItemId,
    pub parent_id: Option<CommentId>,
    pub name: Option<String>,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub likes_count: u64,
    pub liked_by_me: bool,
}
