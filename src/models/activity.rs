// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Collected activity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of activity a collector can discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    GithubRelease,
    MwmblStats,
    MatrixPost,
    GithubPr,
    GithubIssue,
    GithubCommit,
}

impl ActivityType {
    /// All activity types, most important first.
    pub const ALL: [ActivityType; 6] = [
        ActivityType::GithubRelease,
        ActivityType::MwmblStats,
        ActivityType::MatrixPost,
        ActivityType::GithubPr,
        ActivityType::GithubIssue,
        ActivityType::GithubCommit,
    ];

    /// Stored string form (also the document id prefix).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::GithubRelease => "github_release",
            ActivityType::MwmblStats => "mwmbl_stats",
            ActivityType::MatrixPost => "matrix_post",
            ActivityType::GithubPr => "github_pr",
            ActivityType::GithubIssue => "github_issue",
            ActivityType::GithubCommit => "github_commit",
        }
    }

    /// Human-readable section heading.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::GithubRelease => "Releases",
            ActivityType::MwmblStats => "Statistics",
            ActivityType::MatrixPost => "Community Updates",
            ActivityType::GithubPr => "Pull Requests",
            ActivityType::GithubIssue => "Issues",
            ActivityType::GithubCommit => "Development Activity",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown activity type: {}", s))
    }
}

/// Build the store key for an activity.
///
/// The key is the Firestore document id, so uniqueness of
/// `(activity_type, source_id)` is enforced by the store itself.
pub fn activity_key(activity_type: ActivityType, source_id: &str) -> String {
    format!("{}_{}", activity_type.as_str(), urlencoding::encode(source_id))
}

/// Activity as constructed by a collector, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    /// Identifier of the item in the source system
    pub source_id: String,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub author: Option<String>,
    /// When the activity happened in the source system
    pub created_at: DateTime<Utc>,
    /// Whether the collector considers this worth a social post
    pub is_newsworthy: bool,
    /// Source-specific payload
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewActivity {
    pub fn new(
        activity_type: ActivityType,
        source_id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            activity_type,
            source_id: source_id.into(),
            title: title.into(),
            content: String::new(),
            url: None,
            author: None,
            created_at,
            is_newsworthy: false,
            metadata: Map::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn newsworthy(mut self, is_newsworthy: bool) -> Self {
        self.is_newsworthy = is_newsworthy;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Store key derived from `(activity_type, source_id)`.
    pub fn key(&self) -> String {
        activity_key(self.activity_type, &self.source_id)
    }
}

/// Stored activity record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Store key (see [`activity_key`])
    pub id: String,
    pub activity_type: ActivityType,
    pub source_id: String,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When the activity was ingested
    pub collected_at: DateTime<Utc>,
    pub is_newsworthy: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Activity {
    /// Materialize a collected activity at ingestion time.
    pub fn from_new(new: NewActivity, collected_at: DateTime<Utc>) -> Self {
        Self {
            id: new.key(),
            activity_type: new.activity_type,
            source_id: new.source_id,
            title: new.title,
            content: new.content,
            url: new.url,
            author: new.author,
            created_at: new.created_at,
            collected_at,
            is_newsworthy: new.is_newsworthy,
            metadata: new.metadata,
        }
    }
}
