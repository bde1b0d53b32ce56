use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::IdentityToken;
use std::convert::Infallible;

use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Identity of the caller, derived from forwarded-origin headers.
/// Never taken from client input and never echoed back.
pub struct RequesterIdentity(pub IdentityToken);

#[async_trait]
impl FromRequestParts<AppState> for RequesterIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(state.identity.derive(
            header(parts, FORWARDED_FOR),
            header(parts, REAL_IP),
        )))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
