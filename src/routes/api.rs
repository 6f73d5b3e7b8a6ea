// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only diagnostics routes.

use crate::error::{AppError, Result};
use crate::models::PostingStats;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_STATS_DAYS: u32 = 7;
const MAX_STATS_DAYS: u32 = 365;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/connections", get(get_connections))
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub days: Option<u32>,
}

/// Posting statistics for the last `days` days (default 7).
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<PostingStats>> {
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    if !(1..=MAX_STATS_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_STATS_DAYS
        )));
    }

    let stats = state.scheduler.get_posting_stats(days).await?;
    Ok(Json(stats))
}

/// Connectivity of every publisher and the store. 503 if anything is down.
async fn get_connections(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<BTreeMap<String, bool>>) {
    let results = state.scheduler.test_all_connections().await;
    let status = if results.values().all(|ok| *ok) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(results))
}
