use axum::extract::FromRef;
use domain::{CommentService, CommentStore, IdentityDeriver};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub identity: IdentityDeriver,
}

impl AppState {
    pub fn new(store: Arc<dyn CommentStore>, identity_salt: &str) -> Self {
        Self {
            comments: CommentService::new(store),
            identity: IdentityDeriver::new(identity_salt),
        }
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}
