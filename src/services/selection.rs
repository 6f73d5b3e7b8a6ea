// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Selection of activities for posting.
//!
//! Daily candidates go through three steps:
//! 1. Fetch newsworthy, not-yet-posted activities (newest first, capped)
//! 2. Suppress everything if the platform posted within the cooldown
//! 3. Order by type weight plus a recency boost

use crate::db::ActivityStore;
use crate::error::Result;
use crate::models::{Activity, ActivityType, NewPost, Platform, Post};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Weight given to activity types missing from the table.
pub const FALLBACK_PRIORITY: f64 = 1.0;

/// Per-type base weights plus the recency boost cap.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityTable {
    weights: HashMap<ActivityType, f64>,
    /// An activity this many hours old or older gets no boost; a brand new
    /// one gets this many points.
    pub recency_boost_hours: f64,
}

impl Default for PriorityTable {
    fn default() -> Self {
        let weights = HashMap::from([
            (ActivityType::GithubRelease, 10.0),
            (ActivityType::MwmblStats, 8.0),
            (ActivityType::MatrixPost, 7.0),
            (ActivityType::GithubPr, 6.0),
            (ActivityType::GithubIssue, 4.0),
            (ActivityType::GithubCommit, 2.0),
        ]);

        Self {
            weights,
            recency_boost_hours: 5.0,
        }
    }
}

impl PriorityTable {
    /// Table with no per-type weights; every type scores the fallback.
    pub fn empty() -> Self {
        Self {
            weights: HashMap::new(),
            recency_boost_hours: 5.0,
        }
    }

    pub fn with_weight(mut self, activity_type: ActivityType, weight: f64) -> Self {
        self.weights.insert(activity_type, weight);
        self
    }

    pub fn base_priority(&self, activity_type: ActivityType) -> f64 {
        self.weights
            .get(&activity_type)
            .copied()
            .unwrap_or(FALLBACK_PRIORITY)
    }

    /// `max(0, cap - age_hours)`. Future-dated activities count as zero hours
    /// old, so the boost never exceeds the cap.
    pub fn recency_boost(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_hours = ((now - created_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
        (self.recency_boost_hours - age_hours).max(0.0)
    }

    pub fn score(&self, activity: &Activity, now: DateTime<Utc>) -> f64 {
        self.base_priority(activity.activity_type) + self.recency_boost(activity.created_at, now)
    }
}

/// Chooses what to post and records what was posted.
#[derive(Clone)]
pub struct SelectionEngine {
    store: Arc<dyn ActivityStore>,
    priorities: PriorityTable,
    stored_content_limit: usize,
}

impl SelectionEngine {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        priorities: PriorityTable,
        stored_content_limit: usize,
    ) -> Self {
        Self {
            store,
            priorities,
            stored_content_limit,
        }
    }

    pub fn store(&self) -> &Arc<dyn ActivityStore> {
        &self.store
    }

    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    /// Activities to post on `platform` this cycle, highest priority first.
    ///
    /// Empty when nothing qualifies or when the platform's last post is
    /// younger than `min_interval_hours`.
    pub async fn select_for_platform(
        &self,
        since: DateTime<Utc>,
        platform: Platform,
        max_count: usize,
        min_interval_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        let candidates = self.store.newsworthy_since(since, platform, max_count).await?;
        if candidates.is_empty() {
            tracing::debug!(platform = %platform, "No newsworthy activities");
            return Ok(candidates);
        }

        if let Some(last_post) = self.store.last_post_time(platform).await? {
            let elapsed = now - last_post;
            // Beyond the representable range means never post again
            let cooldown = Duration::try_hours(min_interval_hours).unwrap_or(Duration::MAX);
            if elapsed < cooldown {
                tracing::info!(
                    platform = %platform,
                    minutes_since_last_post = elapsed.num_minutes(),
                    min_interval_hours,
                    "Platform in cooldown, skipping"
                );
                return Ok(Vec::new());
            }
        }

        let selected = self.prioritize(candidates, now);

        tracing::info!(
            platform = %platform,
            count = selected.len(),
            top = ?selected
                .iter()
                .take(5)
                .map(|a| format!("{}({:.1})", a.activity_type, self.priorities.score(a, now)))
                .collect::<Vec<_>>(),
            "Selected activities"
        );

        Ok(selected)
    }

    /// Sort by descending score. The sort is stable, so equal scores keep the
    /// store's newest-first order.
    pub fn prioritize(&self, activities: Vec<Activity>, now: DateTime<Utc>) -> Vec<Activity> {
        let mut scored: Vec<(f64, Activity)> = activities
            .into_iter()
            .map(|a| (self.priorities.score(&a, now), a))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, a)| a).collect()
    }

    /// Every activity in `[start, end]`, newsworthy or not.
    pub async fn select_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        let activities = self.store.activities_in_window(start, end).await?;
        tracing::debug!(count = activities.len(), %start, %end, "Loaded window activities");
        Ok(activities)
    }

    /// Record that `activity` was published on `platform`.
    pub async fn mark_posted(
        &self,
        activity: &Activity,
        platform: Platform,
        platform_post_id: &str,
        posted_at: DateTime<Utc>,
    ) -> Result<Post> {
        let post = NewPost::for_activity(
            activity,
            platform,
            platform_post_id,
            posted_at,
            self.stored_content_limit,
        );
        let post = self.store.record_post(&post).await?;

        tracing::debug!(
            activity_id = %activity.id,
            platform = %platform,
            platform_post_id,
            "Marked activity as posted"
        );

        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::NewActivity;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap()
    }

    fn stored(activity_type: ActivityType, source_id: &str, hours_ago: i64) -> Activity {
        Activity::from_new(
            NewActivity::new(
                activity_type,
                source_id,
                source_id,
                now() - Duration::hours(hours_ago),
            )
            .newsworthy(true),
            now(),
        )
    }

    fn engine(db: &MemoryDb) -> SelectionEngine {
        SelectionEngine::new(Arc::new(db.clone()), PriorityTable::default(), 1000)
    }

    #[test]
    fn test_recency_boost_is_capped() {
        let table = PriorityTable::default();

        assert_eq!(table.recency_boost(now(), now()), 5.0);
        assert_eq!(table.recency_boost(now() - Duration::hours(2), now()), 3.0);
        assert_eq!(table.recency_boost(now() - Duration::hours(5), now()), 0.0);
        assert_eq!(table.recency_boost(now() - Duration::hours(30), now()), 0.0);
        // Clock skew: created in the future
        assert_eq!(table.recency_boost(now() + Duration::hours(3), now()), 5.0);
    }

    #[test]
    fn test_base_priority_dominates_recency() {
        let db = MemoryDb::new();
        let release = stored(ActivityType::GithubRelease, "release", 10);
        let commit = stored(ActivityType::GithubCommit, "commit", 0);

        let ordered = engine(&db).prioritize(vec![commit, release], now());

        assert_eq!(ordered[0].source_id, "release");
        assert_eq!(ordered[1].source_id, "commit");
    }

    #[test]
    fn test_recency_orders_same_type() {
        let db = MemoryDb::new();
        let older = stored(ActivityType::GithubCommit, "older", 6);
        let fresh = stored(ActivityType::GithubCommit, "fresh", 0);

        let ordered = engine(&db).prioritize(vec![older, fresh], now());
        assert_eq!(ordered[0].source_id, "fresh");
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let db = MemoryDb::new();
        // Both older than the boost window, so both score exactly 4
        let a = stored(ActivityType::GithubIssue, "a", 8);
        let b = stored(ActivityType::GithubIssue, "b", 9);

        let ordered = engine(&db).prioritize(vec![a, b], now());
        let ids: Vec<&str> = ordered.iter().map(|x| x.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_fallback_and_overrides() {
        let table = PriorityTable::empty().with_weight(ActivityType::GithubCommit, 12.0);

        assert_eq!(table.base_priority(ActivityType::GithubCommit), 12.0);
        assert_eq!(table.base_priority(ActivityType::GithubRelease), FALLBACK_PRIORITY);
    }

    #[tokio::test]
    async fn test_select_then_mark_posted_excludes_activity() {
        let db = MemoryDb::new();
        let engine = engine(&db);
        db.insert_activity_at(
            &NewActivity::new(ActivityType::GithubRelease, "r1", "v1.0", now() - Duration::hours(2))
                .newsworthy(true),
            now(),
        )
        .unwrap();

        let since = now() - Duration::hours(24);
        let selected = engine
            .select_for_platform(since, Platform::Mastodon, 10, 1, now())
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source_id, "r1");

        let post = engine
            .mark_posted(&selected[0], Platform::Mastodon, "42", now() - Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(post.activity_id.as_deref(), Some("github_release_r1"));

        let again = engine
            .select_for_platform(since, Platform::Mastodon, 10, 1, now())
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_recent_post_suppresses_platform() {
        let db = MemoryDb::new();
        let engine = engine(&db);
        let posted = stored(ActivityType::GithubPr, "old", 3);
        engine
            .mark_posted(&posted, Platform::X, "1", now() - Duration::minutes(30))
            .await
            .unwrap();

        for i in 0..5 {
            db.insert_activity_at(
                &NewActivity::new(ActivityType::GithubRelease, format!("r{}", i), "r", now())
                    .newsworthy(true),
                now(),
            )
            .unwrap();
        }

        let since = now() - Duration::hours(24);
        assert!(engine
            .select_for_platform(since, Platform::X, 10, 1, now())
            .await
            .unwrap()
            .is_empty());

        // Other platforms are unaffected by X's cooldown
        assert_eq!(
            engine
                .select_for_platform(since, Platform::Mastodon, 10, 1, now())
                .await
                .unwrap()
                .len(),
            5
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_interval_suppresses_without_panic() {
        let db = MemoryDb::new();
        let engine = engine(&db);
        let posted = stored(ActivityType::GithubPr, "old", 3);
        engine
            .mark_posted(&posted, Platform::Mastodon, "1", now() - Duration::days(400))
            .await
            .unwrap();
        db.insert_activity_at(
            &NewActivity::new(ActivityType::GithubRelease, "r", "r", now()).newsworthy(true),
            now(),
        )
        .unwrap();

        let since = now() - Duration::hours(24);
        let selected = engine
            .select_for_platform(since, Platform::Mastodon, 10, 9_000_000_000_000, now())
            .await
            .unwrap();
        assert!(selected.is_empty());

        let selected = engine
            .select_for_platform(since, Platform::Mastodon, 10, 0, now())
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_posted_truncates_snapshot() {
        let db = MemoryDb::new();
        let engine = SelectionEngine::new(Arc::new(db.clone()), PriorityTable::default(), 10);
        let mut activity = stored(ActivityType::MatrixPost, "$m", 1);
        activity.content = "a long chat message body".to_string();

        let post = engine
            .mark_posted(&activity, Platform::Mastodon, "7", now())
            .await
            .unwrap();

        assert_eq!(post.content, "a long cha");
        assert_eq!(db.posts().await.len(), 1);
    }
}
