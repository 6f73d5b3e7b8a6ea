//! Posting statistics aggregates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Platform, Post};

/// Counts of posts made over some period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingStats {
    /// Total posts recorded
    #[serde(default)]
    pub total_posts: u32,
    /// Post count per platform
    #[serde(default)]
    pub by_platform: BTreeMap<Platform, u32>,
    /// Weekly summary posts (blog articles and their announcements)
    #[serde(default)]
    pub weekly_summaries: u32,
    /// Individual activity posts
    #[serde(default)]
    pub individual_posts: u32,
}

impl PostingStats {
    /// Aggregate a set of posts.
    pub fn from_posts<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Self {
        let mut stats = Self::default();
        for post in posts {
            stats.record(post);
        }
        stats
    }

    /// Count one post.
    pub fn record(&mut self, post: &Post) {
        self.total_posts += 1;
        *self.by_platform.entry(post.platform).or_insert(0) += 1;

        if post.is_weekly_summary {
            self.weekly_summaries += 1;
        } else {
            self.individual_posts += 1;
        }
    }
}
