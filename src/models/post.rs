// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Publish records and target platforms.

use crate::models::Activity;
use crate::time_utils::WeekWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Posting destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mastodon,
    X,
    Blog,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Mastodon, Platform::X, Platform::Blog];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mastodon => "mastodon",
            Platform::X => "x",
            Platform::Blog => "blog",
        }
    }

    /// Social platforms receive individual activity posts; the blog only
    /// receives weekly summaries.
    pub fn is_social(&self) -> bool {
        !matches!(self, Platform::Blog)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Truncate stored content to at most `limit` characters.
fn snapshot(content: &str, limit: usize) -> String {
    content.chars().take(limit).collect()
}

/// Post about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    /// Originating activity (None for weekly summaries)
    pub activity_id: Option<String>,
    pub platform: Platform,
    /// Identifier assigned by the platform
    pub platform_post_id: Option<String>,
    /// Content snapshot (storage only, may be truncated)
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub is_weekly_summary: bool,
    pub week_start: Option<DateTime<Utc>>,
    pub week_end: Option<DateTime<Utc>>,
}

impl NewPost {
    /// Record of an individual activity post.
    pub fn for_activity(
        activity: &Activity,
        platform: Platform,
        platform_post_id: &str,
        posted_at: DateTime<Utc>,
        content_limit: usize,
    ) -> Self {
        Self {
            activity_id: Some(activity.id.clone()),
            platform,
            platform_post_id: Some(platform_post_id.to_string()),
            content: snapshot(&activity.content, content_limit),
            posted_at,
            is_weekly_summary: false,
            week_start: None,
            week_end: None,
        }
    }

    /// Record of a weekly summary post (blog article or social announcement).
    pub fn weekly_summary(
        platform: Platform,
        platform_post_id: &str,
        content: &str,
        window: &WeekWindow,
        posted_at: DateTime<Utc>,
        content_limit: usize,
    ) -> Self {
        Self {
            activity_id: None,
            platform,
            platform_post_id: Some(platform_post_id.to_string()),
            content: snapshot(content, content_limit),
            posted_at,
            is_weekly_summary: true,
            week_start: Some(window.start),
            week_end: Some(window.end),
        }
    }
}

/// Stored post record. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub activity_id: Option<String>,
    pub platform: Platform,
    pub platform_post_id: Option<String>,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub is_weekly_summary: bool,
    pub week_start: Option<DateTime<Utc>>,
    pub week_end: Option<DateTime<Utc>>,
}

impl Post {
    pub fn from_new(id: String, new: NewPost) -> Self {
        Self {
            id,
            activity_id: new.activity_id,
            platform: new.platform,
            platform_post_id: new.platform_post_id,
            content: new.content,
            posted_at: new.posted_at,
            is_weekly_summary: new.is_weekly_summary,
            week_start: new.week_start,
            week_end: new.week_end,
        }
    }
}
