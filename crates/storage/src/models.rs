use chrono::NaiveDateTime;
use domain::{Comment, CommentId, IdentityToken, LikeLedger, MediaItemId};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub media_item_id: String,
    pub parent_id: Option<String>,
    pub name: Option<String>,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(FromRow)]
pub struct SqlLike {
    pub comment_id: String,
    pub identity: String,
}

impl SqlComment {
    pub fn into_comment(self, identities: Vec<String>) -> Comment {
        Comment {
            id: CommentId::new_unchecked(self.id),
            media_item_id: MediaItemId::new_unchecked(self.media_item_id),
            parent_id: self.parent_id.map(CommentId::new_unchecked),
            name: self.name,
            text: self.text,
            created_at: self.created_at,
            updated_at: self.updated_at,
            likes: LikeLedger::from_identities(
                identities.into_iter().map(IdentityToken::new_unchecked),
            ),
        }
    }
}
