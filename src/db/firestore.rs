// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`ActivityStore`].
//!
//! Layout:
//! - `activities/{activity_type}_{urlencoded source_id}`: one document per
//!   activity; the document id is the dedup key, so Firestore's create
//!   semantics enforce uniqueness.
//! - `posts/{generated}`: append-only publish records.
//!
//! Timestamps are stored as RFC3339 strings with a `Z` suffix so string range
//! filters and ordering match chronological order.

use crate::db::{collections, sort_window, ActivityStore};
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityType, NewActivity, NewPost, Platform, Post, PostingStats};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Document id read by the liveness check. Never written.
const PING_DOCUMENT_ID: &str = "__ping__";

/// Most values Firestore accepts in one `in` filter.
const IN_FILTER_LIMIT: usize = 30;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore (emulator)");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// The subset of `activity_ids` already posted to `platform`.
    ///
    /// Looks up only the given ids, [`IN_FILTER_LIMIT`] per query.
    async fn posted_among(
        &self,
        platform: Platform,
        activity_ids: &[String],
    ) -> Result<HashSet<String>> {
        let client = self.get_client()?;
        let platform_name = platform.as_str();
        let mut posted = HashSet::new();

        for batch in activity_ids.chunks(IN_FILTER_LIMIT) {
            let batch = batch.to_vec();
            let posts: Vec<PostDocument> = client
                .fluent()
                .select()
                .from(collections::POSTS)
                .filter(move |q| {
                    q.for_all([
                        q.field("platform").eq(platform_name),
                        q.field("activity_id").is_in(batch.clone()),
                    ])
                })
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            posted.extend(posts.into_iter().filter_map(|p| p.activity_id));
        }

        Ok(posted)
    }
}

// ─── Stored document shapes ─────────────────────────────────────

/// Activity as stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityDocument {
    id: String,
    activity_type: String,
    source_id: String,
    title: String,
    content: String,
    url: Option<String>,
    author: Option<String>,
    created_at: String,
    collected_at: String,
    is_newsworthy: bool,
    /// Source metadata serialized as a JSON object string
    #[serde(default)]
    metadata: String,
}

impl ActivityDocument {
    fn from_new(activity: &NewActivity, collected_at: DateTime<Utc>) -> Result<Self> {
        let metadata = serde_json::to_string(&activity.metadata)
            .map_err(|e| AppError::Database(format!("Failed to encode metadata: {}", e)))?;

        Ok(Self {
            id: activity.key(),
            activity_type: activity.activity_type.as_str().to_string(),
            source_id: activity.source_id.clone(),
            title: activity.title.clone(),
            content: activity.content.clone(),
            url: activity.url.clone(),
            author: activity.author.clone(),
            created_at: format_utc_rfc3339(activity.created_at),
            collected_at: format_utc_rfc3339(collected_at),
            is_newsworthy: activity.is_newsworthy,
            metadata,
        })
    }

    fn into_activity(self) -> Result<Activity> {
        let corrupt = |field: &str, detail: String| {
            AppError::Database(format!("Corrupt activity {} ({}): {}", self.id, field, detail))
        };

        let activity_type: ActivityType = self
            .activity_type
            .parse()
            .map_err(|e: String| corrupt("activity_type", e))?;
        let created_at =
            parse_utc_rfc3339(&self.created_at).map_err(|e| corrupt("created_at", e.to_string()))?;
        let collected_at = parse_utc_rfc3339(&self.collected_at)
            .map_err(|e| corrupt("collected_at", e.to_string()))?;
        let metadata = if self.metadata.is_empty() {
            serde_json::Map::new()
        } else {
            serde_json::from_str(&self.metadata).map_err(|e| corrupt("metadata", e.to_string()))?
        };

        Ok(Activity {
            id: self.id,
            activity_type,
            source_id: self.source_id,
            title: self.title,
            content: self.content,
            url: self.url,
            author: self.author,
            created_at,
            collected_at,
            is_newsworthy: self.is_newsworthy,
            metadata,
        })
    }
}

/// Post as stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostDocument {
    /// Filled from the document name on reads
    #[serde(alias = "_firestore_id", skip_serializing)]
    id: Option<String>,
    activity_id: Option<String>,
    platform: Platform,
    platform_post_id: Option<String>,
    content: String,
    posted_at: String,
    is_weekly_summary: bool,
    week_start: Option<String>,
    week_end: Option<String>,
}

impl PostDocument {
    fn from_new(post: &NewPost) -> Self {
        Self {
            id: None,
            activity_id: post.activity_id.clone(),
            platform: post.platform,
            platform_post_id: post.platform_post_id.clone(),
            content: post.content.clone(),
            posted_at: format_utc_rfc3339(post.posted_at),
            is_weekly_summary: post.is_weekly_summary,
            week_start: post.week_start.map(format_utc_rfc3339),
            week_end: post.week_end.map(format_utc_rfc3339),
        }
    }

    fn into_post(self) -> Result<Post> {
        let id = self.id.unwrap_or_default();
        let parse = |field: &str, value: &str| {
            parse_utc_rfc3339(value)
                .map_err(|e| AppError::Database(format!("Corrupt post {} ({}): {}", id, field, e)))
        };

        let posted_at = parse("posted_at", &self.posted_at)?;
        let week_start = self.week_start.as_deref().map(|v| parse("week_start", v)).transpose()?;
        let week_end = self.week_end.as_deref().map(|v| parse("week_end", v)).transpose()?;

        Ok(Post {
            id,
            activity_id: self.activity_id,
            platform: self.platform,
            platform_post_id: self.platform_post_id,
            content: self.content,
            posted_at,
            is_weekly_summary: self.is_weekly_summary,
            week_start,
            week_end,
        })
    }
}

fn into_activities(docs: Vec<ActivityDocument>) -> Result<Vec<Activity>> {
    docs.into_iter().map(ActivityDocument::into_activity).collect()
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn insert_activity(&self, activity: &NewActivity) -> Result<bool> {
        let doc = ActivityDocument::from_new(activity, Utc::now())?;

        let result: std::result::Result<ActivityDocument, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACTIVITIES)
            .document_id(&doc.id)
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(activity_id = %doc.id, "Activity stored");
                Ok(true)
            }
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                tracing::debug!(activity_id = %doc.id, "Activity already stored");
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn record_post(&self, post: &NewPost) -> Result<Post> {
        let doc = PostDocument::from_new(post);

        let stored: PostDocument = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::POSTS)
            .generate_document_id()
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stored.into_post()
    }

    async fn newsworthy_since(
        &self,
        since: DateTime<Utc>,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<Activity>> {
        let since = format_utc_rfc3339(since);

        let docs: Vec<ActivityDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("is_newsworthy").eq(true),
                    q.field("created_at").greater_than_or_equal(since.clone()),
                ])
            })
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Firestore has no anti-join, so already-posted activities are
        // dropped here before the limit applies.
        let ids: Vec<String> = docs.iter().map(|doc| doc.id.clone()).collect();
        let posted = self.posted_among(platform, &ids).await?;

        into_activities(
            docs.into_iter()
                .filter(|doc| !posted.contains(&doc.id))
                .take(limit)
                .collect(),
        )
    }

    async fn activities_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        let start = format_utc_rfc3339(start);
        let end = format_utc_rfc3339(end);

        let docs: Vec<ActivityDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("created_at").greater_than_or_equal(start.clone()),
                    q.field("created_at").less_than_or_equal(end.clone()),
                ])
            })
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut activities = into_activities(docs)?;
        sort_window(&mut activities);
        Ok(activities)
    }

    async fn last_post_time(&self, platform: Platform) -> Result<Option<DateTime<Utc>>> {
        let platform_name = platform.as_str();
        let latest: Vec<PostDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(move |q| q.field("platform").eq(platform_name))
            .order_by([("posted_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        latest
            .into_iter()
            .next()
            .map(|doc| doc.into_post().map(|post| post.posted_at))
            .transpose()
    }

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<PostingStats> {
        let since = format_utc_rfc3339(since);
        let docs: Vec<PostDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(move |q| q.field("posted_at").greater_than_or_equal(since.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let posts = docs
            .into_iter()
            .map(PostDocument::into_post)
            .collect::<Result<Vec<_>>>()?;

        Ok(PostingStats::from_posts(&posts))
    }

    async fn ping(&self) -> Result<()> {
        let _: Option<ActivityDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(PING_DOCUMENT_ID)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_activity_document_round_trip() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let collected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let new = NewActivity::new(ActivityType::GithubRelease, "v1.2.0", "Release v1.2.0", created)
            .with_url("https://github.com/mwmbl/mwmbl/releases/v1.2.0")
            .with_metadata("tag", json!("v1.2.0"))
            .newsworthy(true);

        let doc = ActivityDocument::from_new(&new, collected).unwrap();
        assert_eq!(doc.id, "github_release_v1.2.0");
        assert_eq!(doc.created_at, "2024-01-15T09:30:00Z");

        let activity = doc.into_activity().unwrap();
        assert_eq!(activity, Activity::from_new(new, collected));
    }

    #[test]
    fn test_corrupt_activity_type_is_database_error() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let mut doc = ActivityDocument::from_new(
            &NewActivity::new(ActivityType::GithubPr, "1", "PR", created),
            created,
        )
        .unwrap();
        doc.activity_type = "tweet".to_string();

        assert!(doc.into_activity().unwrap_err().is_storage_error());
    }

    #[test]
    fn test_post_document_keeps_window_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = crate::time_utils::WeekWindow::starting(start);
        let new = NewPost::weekly_summary(Platform::Blog, "2024-01-15.md", "# Week", &window, start, 1000);

        let mut doc = PostDocument::from_new(&new);
        assert_eq!(doc.week_end.as_deref(), Some("2024-01-21T23:59:59Z"));

        doc.id = Some("abc".to_string());
        let post = doc.into_post().unwrap();
        assert_eq!(post, Post::from_new("abc".to_string(), new));
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_errors() {
        let db = FirestoreDb::new_mock();
        assert!(db.ping().await.unwrap_err().is_storage_error());
        assert!(db.last_post_time(Platform::X).await.is_err());
    }
}
