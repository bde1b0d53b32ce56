use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidId(String),

    #[error("Comment not found")]
    NotFound,

    #[error("This comment was already liked from this origin")]
    AlreadyLiked { likes_count: u64 },

    #[error("This comment is not currently liked from this origin")]
    NotLiked { likes_count: u64 },

    #[error("Comment store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl CommentError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyLiked { .. } | Self::NotLiked { .. })
    }

    /// Count the caller can resynchronize with, when the failure carries one.
    pub fn likes_count(&self) -> Option<u64> {
        match self {
            Self::AlreadyLiked { likes_count } | Self::NotLiked { likes_count } => {
                Some(*likes_count)
            }
            _ => None,
        }
    }
}
