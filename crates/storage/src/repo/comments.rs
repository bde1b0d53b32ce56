use chrono::Utc;
use domain::{Comment, CommentId, MediaItemId, NewComment};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    models::{SqlComment, SqlLike},
    Db,
};

// SQLite's bound-parameter limit is 999 on older builds.
const COUNT_CHUNK: usize = 500;

impl Db {
    pub async fn insert_comment(&self, new: NewComment) -> anyhow::Result<Comment> {
        let now = Utc::now().naive_utc();
        let id = CommentId::generate();

        sqlx::query(
            r#"
            INSERT INTO comments (id, media_item_id, parent_id, name, text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(new.media_item_id.as_str())
        .bind(new.parent_id.as_ref().map(CommentId::as_str))
        .bind(&new.name)
        .bind(&new.text)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id,
            media_item_id: new.media_item_id,
            parent_id: new.parent_id,
            name: new.name,
            text: new.text,
            created_at: now,
            updated_at: now,
            likes: Default::default(),
        })
    }

    pub async fn get_comment(&self, id: &CommentId) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT id, media_item_id, parent_id, name, text, created_at, updated_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let identities: Vec<String> =
            sqlx::query_scalar("SELECT identity FROM comment_likes WHERE comment_id = ?")
                .bind(id.as_str())
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some(row.into_comment(identities)))
    }

    pub async fn list_comments(&self, media_item_id: &MediaItemId) -> anyhow::Result<Vec<Comment>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT id, media_item_id, parent_id, name, text, created_at, updated_at
            FROM comments
            WHERE media_item_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(media_item_id.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let likes = sqlx::query_as::<_, SqlLike>(
            r#"
            SELECT l.comment_id, l.identity
            FROM comment_likes l
            JOIN comments c ON c.id = l.comment_id
            WHERE c.media_item_id = ?
            "#,
        )
        .bind(media_item_id.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_comment: HashMap<String, Vec<String>> = HashMap::new();
        for like in likes {
            by_comment
                .entry(like.comment_id)
                .or_default()
                .push(like.identity);
        }

        let comments = rows
            .into_iter()
            .map(|row| {
                let identities = by_comment.remove(&row.id).unwrap_or_default();
                row.into_comment(identities)
            })
            .collect();
        Ok(comments)
    }

    pub async fn count_comments(
        &self,
        ids: &BTreeSet<MediaItemId>,
    ) -> anyhow::Result<BTreeMap<MediaItemId, u64>> {
        let mut counts: BTreeMap<MediaItemId, u64> = ids.iter().map(|id| (id.clone(), 0)).collect();
        let ids: Vec<&MediaItemId> = ids.iter().collect();

        for chunk in ids.chunks(COUNT_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT media_item_id, COUNT(*) FROM comments WHERE media_item_id IN (",
            );
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(id.as_str());
            }
            separated.push_unseparated(") GROUP BY media_item_id");

            let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
            for (media_item_id, count) in rows {
                counts.insert(
                    MediaItemId::new_unchecked(media_item_id),
                    count.max(0) as u64,
                );
            }
        }

        Ok(counts)
    }
}
