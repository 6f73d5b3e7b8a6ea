//! Storage layer: the `ActivityStore` boundary and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::Result;
use crate::models::{Activity, NewActivity, NewPost, Platform, Post, PostingStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    /// Activities, keyed by `<activity_type>_<urlencoded source_id>`
    pub const ACTIVITIES: &str = "activities";
    /// Append-only publish records
    pub const POSTS: &str = "posts";
}

/// Persisted, deduplicated record of activities and of what has been posted.
///
/// Every mutating call is a single atomic write; a failure never leaves a
/// partial record visible.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Persist one activity. Returns `false` (not an error) when an activity
    /// with the same `(activity_type, source_id)` already exists.
    async fn insert_activity(&self, activity: &NewActivity) -> Result<bool>;

    /// Append a post record.
    async fn record_post(&self, post: &NewPost) -> Result<Post>;

    /// Newsworthy activities created at or after `since` that have no post on
    /// `platform`, newest first, at most `limit`.
    async fn newsworthy_since(
        &self,
        since: DateTime<Utc>,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<Activity>>;

    /// All activities created within `[start, end]`, ordered by activity type
    /// then newest first.
    async fn activities_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>>;

    /// Most recent `posted_at` of any post to `platform`.
    async fn last_post_time(&self, platform: Platform) -> Result<Option<DateTime<Utc>>>;

    /// Aggregate counts of posts made at or after `since`.
    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<PostingStats>;

    /// Storage liveness check.
    async fn ping(&self) -> Result<()>;
}

/// Order a window result by activity type, keeping newest-first order within
/// each type.
pub(crate) fn sort_window(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        a.activity_type
            .as_str()
            .cmp(b.activity_type.as_str())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
