// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform publisher boundary.

use crate::time_utils::WeekWindow;
use async_trait::async_trait;

/// A posting destination client (Mastodon, X, a blog repository...).
///
/// `Ok(None)` means the platform accepted the call but produced no post; the
/// caller treats it like a failed publish without an error to log.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish already formatted content, returning the platform's post id.
    async fn publish(&self, content: &str) -> anyhow::Result<Option<String>>;

    /// Publish a weekly summary. Social platforms usually shorten it into an
    /// announcement; the blog writes the full article.
    async fn publish_weekly_summary(
        &self,
        summary: &str,
        _window: &WeekWindow,
    ) -> anyhow::Result<Option<String>> {
        self.publish(summary).await
    }

    /// Whether credentials and connectivity work.
    async fn test_connection(&self) -> anyhow::Result<bool>;
}
