use chrono::Utc;
use domain::{CommentId, IdentityToken, LikeOutcome, LikeTransition};

use crate::Db;

impl Db {
    /// Conditional write first, so the transaction holds SQLite's write lock
    /// before anything is read back.
    pub async fn apply_like_transition(
        &self,
        id: &CommentId,
        identity: &IdentityToken,
        transition: LikeTransition,
    ) -> anyhow::Result<LikeOutcome> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let changed = match transition {
            LikeTransition::Like => sqlx::query(
                r#"
                INSERT OR IGNORE INTO comment_likes (comment_id, identity, created_at)
                SELECT id, ?, ? FROM comments WHERE id = ?
                "#,
            )
            .bind(identity.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            LikeTransition::Unlike => {
                sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND identity = ?")
                    .bind(id.as_str())
                    .bind(identity.as_str())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
        } > 0;

        if changed {
            sqlx::query("UPDATE comments SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM comment_likes WHERE comment_id = c.id)
            FROM comments c
            WHERE c.id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        let Some(count) = count else {
            return Ok(LikeOutcome::Missing);
        };
        let likes_count = count.max(0) as u64;

        Ok(match (changed, transition) {
            (true, _) => LikeOutcome::Applied { likes_count },
            (false, LikeTransition::Like) => LikeOutcome::AlreadyLiked { likes_count },
            (false, LikeTransition::Unlike) => LikeOutcome::NotLiked { likes_count },
        })
    }
}
