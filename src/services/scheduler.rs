// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Posting orchestration.
//!
//! Drives the two posting cycles:
//! - Daily: for each social platform, select → format → publish → record
//! - Weekly: window → summarize → publish to blog → announce on social → record
//!
//! Collector, formatter and single-publish failures are logged and isolated.
//! Only a failed weekly blog publish fails a whole cycle.

use crate::config::Config;
use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::{Activity, NewPost, Platform, PostingStats};
use crate::services::collection::{CollectionRunner, Collector};
use crate::services::formatter::{Formatter, PlainFormatter};
use crate::services::publisher::Publisher;
use crate::services::selection::SelectionEngine;
use crate::services::summarizer::{DigestSummarizer, Summarizer};
use crate::time_utils::WeekWindow;
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rolling lookback of the daily cycle.
pub const DAILY_LOOKBACK_HOURS: i64 = 24;

/// Result of one platform's daily run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    /// The run finished; individual publishes may still have failed.
    Completed {
        posted_count: usize,
        total_activities: usize,
    },
    /// The run failed before producing counts (e.g. storage unavailable).
    Failed { error: String },
}

impl PlatformOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PlatformOutcome::Completed { .. })
    }
}

/// Result of a weekly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeeklyOutcome {
    Published {
        /// Blog post id
        post_id: String,
        window: WeekWindow,
        activity_count: usize,
        /// Social announcement ids, for platforms that accepted one
        announcements: BTreeMap<Platform, String>,
    },
    /// No activities in the window. Not a failure.
    NothingToSummarize { window: WeekWindow },
    Failed { window: WeekWindow, error: String },
}

impl WeeklyOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, WeeklyOutcome::Failed { .. })
    }

    pub fn window(&self) -> &WeekWindow {
        match self {
            WeeklyOutcome::Published { window, .. }
            | WeeklyOutcome::NothingToSummarize { window }
            | WeeklyOutcome::Failed { window, .. } => window,
        }
    }
}

/// Orchestrates collection and posting.
pub struct TaskScheduler {
    selection: SelectionEngine,
    collection: CollectionRunner,
    publishers: BTreeMap<Platform, Arc<dyn Publisher>>,
    formatter: Arc<dyn Formatter>,
    summarizer: Arc<dyn Summarizer>,
    max_daily_posts: usize,
    min_post_interval_hours: i64,
    stored_content_limit: usize,
}

impl TaskScheduler {
    /// Scheduler with no collectors or publishers, the template formatter and
    /// the digest summarizer.
    pub fn new(config: &Config, store: Arc<dyn ActivityStore>) -> Self {
        Self {
            selection: SelectionEngine::new(
                store.clone(),
                config.priorities.clone(),
                config.stored_content_limit,
            ),
            collection: CollectionRunner::new(store),
            publishers: BTreeMap::new(),
            formatter: Arc::new(PlainFormatter::default()),
            summarizer: Arc::new(DigestSummarizer::default()),
            max_daily_posts: config.max_daily_posts,
            min_post_interval_hours: config.min_post_interval_hours,
            stored_content_limit: config.stored_content_limit,
        }
    }

    pub fn with_collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collection.add_collector(collector);
        self
    }

    /// Register the publisher for `platform`, replacing any previous one.
    pub fn with_publisher(mut self, platform: Platform, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.insert(platform, publisher);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    fn store(&self) -> &Arc<dyn ActivityStore> {
        self.selection.store()
    }

    // ─── Collection ──────────────────────────────────────────────

    /// Run every collector; returns the number of newly stored activities.
    pub async fn run_data_collection(&self, since: Option<DateTime<Utc>>) -> usize {
        self.collection.run_all(since).await
    }

    // ─── Daily posting ───────────────────────────────────────────

    pub async fn run_daily_posting(&self) -> BTreeMap<Platform, PlatformOutcome> {
        self.run_daily_posting_at(Utc::now()).await
    }

    /// Daily cycle over every social platform that has a publisher.
    pub async fn run_daily_posting_at(
        &self,
        now: DateTime<Utc>,
    ) -> BTreeMap<Platform, PlatformOutcome> {
        let since = now - Duration::hours(DAILY_LOOKBACK_HOURS);

        let platforms: Vec<(Platform, Arc<dyn Publisher>)> = self
            .publishers
            .iter()
            .filter(|(platform, _)| platform.is_social())
            .map(|(platform, publisher)| (*platform, publisher.clone()))
            .collect();

        tracing::info!(platforms = platforms.len(), %since, "Starting daily posting");

        let results = join_all(platforms.into_iter().map(|(platform, publisher)| async move {
            let outcome = match self
                .post_to_platform(platform, publisher.as_ref(), since, now)
                .await
            {
                Ok((posted_count, total_activities)) => PlatformOutcome::Completed {
                    posted_count,
                    total_activities,
                },
                Err(e) => {
                    tracing::error!(platform = %platform, error = %e, "Daily posting failed");
                    PlatformOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            (platform, outcome)
        }))
        .await;

        let results: BTreeMap<Platform, PlatformOutcome> = results.into_iter().collect();
        tracing::info!(results = ?results, "Daily posting completed");
        results
    }

    /// Returns `(posted, selected)`.
    async fn post_to_platform(
        &self,
        platform: Platform,
        publisher: &dyn Publisher,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(usize, usize)> {
        let activities = self
            .selection
            .select_for_platform(
                since,
                platform,
                self.max_daily_posts,
                self.min_post_interval_hours,
                now,
            )
            .await?;

        let mut posted = 0;
        for activity in &activities {
            if self.post_activity(platform, publisher, activity, now).await {
                posted += 1;
            }
        }

        tracing::info!(
            platform = %platform,
            posted,
            selected = activities.len(),
            "Platform posting finished"
        );

        Ok((posted, activities.len()))
    }

    /// Format, publish and record one activity; true only once the post is
    /// recorded. Every failure is logged here.
    async fn post_activity(
        &self,
        platform: Platform,
        publisher: &dyn Publisher,
        activity: &Activity,
        now: DateTime<Utc>,
    ) -> bool {
        let content = match self.formatter.format(activity, platform) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(activity_id = %activity.id, platform = %platform, error = %e, "Formatting failed");
                return false;
            }
        };

        let post_id = match publisher.publish(&content).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::warn!(activity_id = %activity.id, platform = %platform, "Publisher returned no post id");
                return false;
            }
            Err(e) => {
                tracing::error!(activity_id = %activity.id, platform = %platform, error = %e, "Publish failed");
                return false;
            }
        };

        // Live but unrecorded: not counted, and eligible again next cycle.
        // The remaining activities still go out.
        match self
            .selection
            .mark_posted(activity, platform, &post_id, now)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    activity_id = %activity.id,
                    platform = %platform,
                    platform_post_id = %post_id,
                    error = %e,
                    "Published but failed to record post"
                );
                false
            }
        }
    }

    // ─── Weekly posting ──────────────────────────────────────────

    pub async fn run_weekly_posting(&self) -> WeeklyOutcome {
        self.run_weekly_posting_at(Utc::now()).await
    }

    /// Weekly cycle for the calendar week containing `now`.
    pub async fn run_weekly_posting_at(&self, now: DateTime<Utc>) -> WeeklyOutcome {
        let window = WeekWindow::containing(now);
        tracing::info!(week = %window.describe(), "Starting weekly posting");

        let outcome = match self.publish_weekly(&window, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    week = %window.describe(),
                    storage = e.is_storage_error(),
                    error = %e,
                    "Weekly posting failed"
                );
                WeeklyOutcome::Failed {
                    window,
                    error: e.to_string(),
                }
            }
        };

        tracing::info!(outcome = ?outcome, "Weekly posting completed");
        outcome
    }

    async fn publish_weekly(
        &self,
        window: &WeekWindow,
        now: DateTime<Utc>,
    ) -> Result<WeeklyOutcome> {
        let activities = self
            .selection
            .select_window(window.start, window.end)
            .await?;

        if activities.is_empty() {
            tracing::info!(week = %window.describe(), "No activities to summarize");
            return Ok(WeeklyOutcome::NothingToSummarize { window: *window });
        }

        let blog = self
            .publishers
            .get(&Platform::Blog)
            .ok_or_else(|| AppError::Publisher("No blog publisher configured".to_string()))?;

        let summary = self
            .summarizer
            .summarize(&activities, window)
            .await
            .map_err(|e| AppError::Summarizer(e.to_string()))?;

        let post_id = blog
            .publish_weekly_summary(&summary, window)
            .await
            .map_err(|e| AppError::Publisher(format!("Blog publish failed: {}", e)))?
            .ok_or_else(|| AppError::Publisher("Failed to post weekly summary".to_string()))?;

        self.record_weekly_post(Platform::Blog, &post_id, &summary, window, now)
            .await;

        let announcements = self.announce_weekly(&summary, window, now).await;

        tracing::info!(
            post_id = %post_id,
            activities = activities.len(),
            announcements = announcements.len(),
            "Weekly summary published"
        );

        Ok(WeeklyOutcome::Published {
            post_id,
            window: *window,
            activity_count: activities.len(),
            announcements,
        })
    }

    /// Announce on every social platform. Failures are logged only.
    async fn announce_weekly(
        &self,
        summary: &str,
        window: &WeekWindow,
        now: DateTime<Utc>,
    ) -> BTreeMap<Platform, String> {
        let social = self
            .publishers
            .iter()
            .filter(|(platform, _)| platform.is_social());

        let results = join_all(social.map(|(platform, publisher)| async move {
            match publisher.publish_weekly_summary(summary, window).await {
                Ok(Some(id)) => {
                    self.record_weekly_post(*platform, &id, summary, window, now)
                        .await;
                    Some((*platform, id))
                }
                Ok(None) => {
                    tracing::warn!(platform = %platform, "Weekly announcement not published");
                    None
                }
                Err(e) => {
                    tracing::error!(platform = %platform, error = %e, "Weekly announcement failed");
                    None
                }
            }
        }))
        .await;

        results.into_iter().flatten().collect()
    }

    async fn record_weekly_post(
        &self,
        platform: Platform,
        platform_post_id: &str,
        content: &str,
        window: &WeekWindow,
        now: DateTime<Utc>,
    ) {
        let post = NewPost::weekly_summary(
            platform,
            platform_post_id,
            content,
            window,
            now,
            self.stored_content_limit,
        );

        if let Err(e) = self.store().record_post(&post).await {
            tracing::error!(
                platform = %platform,
                platform_post_id,
                error = %e,
                "Failed to record weekly summary post"
            );
        }
    }

    // ─── Diagnostics and statistics ─────────────────────────────

    /// Connectivity of every registered publisher plus the store, keyed
    /// `"<platform>_publisher"` and `"database"`.
    pub async fn test_all_connections(&self) -> BTreeMap<String, bool> {
        let publisher_checks = self.publishers.iter().map(|(platform, publisher)| async move {
            let connected = match publisher.test_connection().await {
                Ok(connected) => connected,
                Err(e) => {
                    tracing::error!(platform = %platform, error = %e, "Publisher connection test failed");
                    false
                }
            };
            (format!("{}_publisher", platform), connected)
        });

        let (mut results, database) = futures_util::join!(
            async { join_all(publisher_checks).await.into_iter().collect::<BTreeMap<_, _>>() },
            async {
                match self.store().ping().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(error = %e, "Database connection test failed");
                        false
                    }
                }
            }
        );
        results.insert("database".to_string(), database);

        tracing::info!(results = ?results, "Connection test results");
        results
    }

    pub async fn get_posting_stats(&self, days: u32) -> Result<PostingStats> {
        self.get_posting_stats_at(days, Utc::now()).await
    }

    /// Posts made in the `days` days before `now`.
    pub async fn get_posting_stats_at(&self, days: u32, now: DateTime<Utc>) -> Result<PostingStats> {
        let since = now - Duration::days(i64::from(days));
        self.store().count_posts_since(since).await
    }
}
