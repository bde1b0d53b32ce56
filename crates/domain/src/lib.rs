mod error;
mod identity;
mod ledger;
mod models;
mod service;
mod store;
pub mod tree;

pub use error::CommentError;
pub use identity::{IdentityDeriver, IdentityToken};
pub use ledger::{LedgerRejection, LikeLedger, LikeOutcome, LikeTransition};
pub use models::{
    Comment, CommentId, CommentView, MediaItemId, NewComment, ANONYMOUS_NAME, MAX_NAME_CHARS,
    MAX_TEXT_CHARS,
};
pub use service::{CommentService, PostCommentInput};
pub use store::CommentStore;
pub use tree::{CommentTree, Thread};
