use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::{CommentError, CommentService, CommentView, PostCommentInput, Thread};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::http::{error::ApiError, identity::RequesterIdentity};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub media_item_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    /// Comma-separated.
    pub media_item_ids: Option<String>,
}

pub async fn list_comments(
    State(comments): State<CommentService>,
    RequesterIdentity(who): RequesterIdentity,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let list = comments
        .list_comments(q.media_item_id.as_deref(), &who)
        .await?;
    Ok(Json(list))
}

pub async fn comment_tree(
    State(comments): State<CommentService>,
    RequesterIdentity(who): RequesterIdentity,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Thread<CommentView>>>, ApiError> {
    let threads = comments
        .comment_threads(q.media_item_id.as_deref(), &who)
        .await?;
    Ok(Json(threads))
}

pub async fn post_comment(
    State(comments): State<CommentService>,
    RequesterIdentity(who): RequesterIdentity,
    payload: Result<Json<PostCommentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let Json(input) =
        payload.map_err(|e| CommentError::Validation(format!("Invalid request body: {}", e)))?;

    let created = comments.post_comment(input).await?;
    tracing::info!(
        "Comment {} posted on media item {}",
        created.id,
        created.media_item_id
    );
    Ok((StatusCode::CREATED, Json(created.view_for(&who))))
}

pub async fn like_comment(
    State(comments): State<CommentService>,
    RequesterIdentity(who): RequesterIdentity,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let likes_count = comments.like(&comment_id, &who).await?;
    Ok(Json(json!({ "likesCount": likes_count })))
}

pub async fn unlike_comment(
    State(comments): State<CommentService>,
    RequesterIdentity(who): RequesterIdentity,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let likes_count = comments.unlike(&comment_id, &who).await?;
    Ok(Json(json!({ "likesCount": likes_count })))
}

pub async fn count_comments(
    State(comments): State<CommentService>,
    Query(q): Query<CountQuery>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError> {
    let ids = q
        .media_item_ids
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| raw.split(',').map(str::trim));

    let counts = comments.count_for_media_items(ids).await?;
    Ok(Json(counts))
}
