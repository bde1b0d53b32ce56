use super::handlers::{comments, health};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::DELETE];

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route("/api/comments/tree", get(comments::comment_tree))
        .route("/api/comments/count", get(comments::count_comments))
        .route(
            "/api/comments/:id/like",
            post(comments::like_comment).delete(comments::unlike_comment),
        )
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let any = || {
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    };

    if allowed_origins == "*" {
        return any();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        any()
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(origins)
            .allow_headers(Any)
    }
}
