// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_herald::error::AppError;
use axum::http::StatusCode;
use axum::response::IntoResponse;

async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_is_storage_error() {
    assert!(AppError::Database("connection reset".to_string()).is_storage_error());
    assert!(!AppError::Publisher("rate limited".to_string()).is_storage_error());
    assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_storage_error());
}

#[tokio::test]
async fn test_bad_request_includes_details() {
    let (status, body) = body_of(AppError::BadRequest("days must be positive".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["details"], "days must be positive");
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = body_of(AppError::Database("credentials for project x".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_upstream_errors_are_bad_gateway() {
    let (status, body) = body_of(AppError::Publisher("mastodon 502".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "publisher_error");

    let (status, _) = body_of(AppError::Summarizer("timeout".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_internal_error_from_anyhow() {
    let err: AppError = anyhow::anyhow!("unexpected").into();
    let (status, body) = body_of(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}
