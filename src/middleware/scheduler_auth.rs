// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication for scheduler-triggered routes.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <SCHEDULER_TOKEN>` on `/tasks/*` and `/api/*`.
pub async fn require_scheduler_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(presented) = bearer_token(request.headers()) else {
        tracing::warn!(path = %request.uri().path(), "Blocked request without bearer token");
        return Err(StatusCode::FORBIDDEN);
    };

    if !token_matches(presented, &state.config.scheduler_token) {
        tracing::warn!(path = %request.uri().path(), "Blocked request with invalid bearer token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Constant-time comparison. An empty expected token never matches.
fn token_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
