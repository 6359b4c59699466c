//! Caller identity set by the authenticating front end (e.g. `X-Remote-User`).

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

/// Header carrying the authenticated username. Default: `X-Remote-User`.
pub const REMOTE_USER_HEADER: &str = "X-Remote-User";

/// Extractor for the optional username from the `X-Remote-User` header.
#[derive(Clone, Debug)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(REMOTE_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Identity(value))
    }
}
