// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler-triggered task routes.
//!
//! Called by Cloud Scheduler (or cron) with the scheduler bearer token.
//! A non-2xx status tells the scheduler the run failed and should alert or
//! retry; partial per-item failures only show up in logs and counts.

use crate::error::{AppError, Result};
use crate::models::Platform;
use crate::services::{PlatformOutcome, WeeklyOutcome};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default collection lookback.
const DEFAULT_COLLECT_HOURS: u32 = 24;
/// One year.
const MAX_COLLECT_HOURS: u32 = 24 * 365;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/collect", post(collect))
        .route("/tasks/daily", post(daily))
        .route("/tasks/weekly", post(weekly))
}

#[derive(Debug, Deserialize)]
pub struct CollectParams {
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub collected: usize,
}

/// Collect activities from the last `hours` hours (default 24).
async fn collect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CollectParams>,
) -> Result<Json<CollectResponse>> {
    let hours = params.hours.unwrap_or(DEFAULT_COLLECT_HOURS);
    if hours == 0 || hours > MAX_COLLECT_HOURS {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {}",
            MAX_COLLECT_HOURS
        )));
    }

    let since = Utc::now() - Duration::hours(i64::from(hours));
    let collected = state.scheduler.run_data_collection(Some(since)).await;

    Ok(Json(CollectResponse { collected }))
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    /// False if any platform run failed outright
    pub success: bool,
    pub platforms: BTreeMap<Platform, PlatformOutcome>,
}

/// Run the daily posting cycle. Always 200; see `success` per platform.
async fn daily(State(state): State<Arc<AppState>>) -> Json<DailyResponse> {
    let platforms = state.scheduler.run_daily_posting().await;
    let success = platforms.values().all(PlatformOutcome::is_success);

    Json(DailyResponse { success, platforms })
}

/// Run the weekly summary cycle. 500 when the blog post failed.
async fn weekly(State(state): State<Arc<AppState>>) -> (StatusCode, Json<WeeklyOutcome>) {
    let outcome = state.scheduler.run_weekly_posting().await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(outcome))
}
