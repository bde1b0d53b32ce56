use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::CommentError;
use serde_json::json;

pub struct ApiError(pub CommentError);

impl From<CommentError> for ApiError {
    fn from(e: CommentError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CommentError::Validation(_) | CommentError::InvalidId(_) => StatusCode::BAD_REQUEST,
            CommentError::NotFound => StatusCode::NOT_FOUND,
            CommentError::AlreadyLiked { .. } | CommentError::NotLiked { .. } => {
                StatusCode::FORBIDDEN
            }
            CommentError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        // conflicts carry the live count so the caller can resync in place
        let body = match self.0.likes_count() {
            Some(likes_count) => json!({ "error": self.0.to_string(), "likesCount": likes_count }),
            None => json!({ "error": self.0.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
