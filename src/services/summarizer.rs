// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly summary generation.

use crate::models::{Activity, ActivityType};
use crate::time_utils::WeekWindow;
use async_trait::async_trait;
use std::sync::Arc;

/// Items listed per activity type before collapsing into "...and N more".
const MAX_ITEMS_PER_GROUP: usize = 5;

/// Produces the weekly article from the week's activities.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, activities: &[Activity], window: &WeekWindow) -> anyhow::Result<String>;
}

/// Deterministic markdown digest grouped by activity type.
#[derive(Debug, Clone)]
pub struct DigestSummarizer {
    /// Line appended after the digest, if any
    pub footer: Option<String>,
}

impl Default for DigestSummarizer {
    fn default() -> Self {
        Self {
            footer: Some(
                "*Want to get involved? Check out our [GitHub repositories](https://github.com/mwmbl) \
                 or join our [Matrix community](https://matrix.to/#/#mwmbl:matrix.org)!*"
                    .to_string(),
            ),
        }
    }
}

impl DigestSummarizer {
    pub fn digest(&self, activities: &[Activity], window: &WeekWindow) -> String {
        let mut lines = vec![
            format!("# Weekly Update: {}", window.describe()),
            String::new(),
        ];

        if activities.is_empty() {
            lines.push("A quiet week with no recorded activity.".to_string());
        } else {
            lines.push(format!(
                "This week we had {} activities across the project:",
                activities.len()
            ));
            lines.push(String::new());
        }

        for activity_type in ActivityType::ALL {
            let group: Vec<&Activity> = activities
                .iter()
                .filter(|a| a.activity_type == activity_type)
                .collect();
            if group.is_empty() {
                continue;
            }

            lines.push(format!("## {}", activity_type.label()));
            lines.push(String::new());
            for activity in group.iter().take(MAX_ITEMS_PER_GROUP) {
                lines.push(format!("- {}", activity.title));
                if let Some(url) = &activity.url {
                    lines.push(format!("  - [View details]({})", url));
                }
            }
            if group.len() > MAX_ITEMS_PER_GROUP {
                lines.push(format!("- ...and {} more", group.len() - MAX_ITEMS_PER_GROUP));
            }
            lines.push(String::new());
        }

        if let Some(footer) = &self.footer {
            lines.push("---".to_string());
            lines.push(String::new());
            lines.push(footer.clone());
        }

        lines.join("\n")
    }
}

#[async_trait]
impl Summarizer for DigestSummarizer {
    async fn summarize(&self, activities: &[Activity], window: &WeekWindow) -> anyhow::Result<String> {
        Ok(self.digest(activities, window))
    }
}

/// Wraps a primary summarizer (typically a language model) and falls back
/// to the digest when it fails.
#[derive(Clone)]
pub struct FallbackSummarizer {
    primary: Arc<dyn Summarizer>,
    fallback: DigestSummarizer,
}

impl FallbackSummarizer {
    pub fn new(primary: Arc<dyn Summarizer>) -> Self {
        Self {
            primary,
            fallback: DigestSummarizer::default(),
        }
    }
}

#[async_trait]
impl Summarizer for FallbackSummarizer {
    async fn summarize(&self, activities: &[Activity], window: &WeekWindow) -> anyhow::Result<String> {
        match self.primary.summarize(activities, window).await {
            Ok(summary) if !summary.trim().is_empty() => Ok(summary),
            Ok(_) => {
                tracing::warn!("Primary summarizer returned empty text, using digest");
                Ok(self.fallback.digest(activities, window))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Primary summarizer failed, using digest");
                Ok(self.fallback.digest(activities, window))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewActivity;
    use chrono::{Duration, TimeZone, Utc};

    fn window() -> WeekWindow {
        WeekWindow::starting(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    }

    fn activity(activity_type: ActivityType, n: i64) -> Activity {
        let at = window().start + Duration::hours(n);
        Activity::from_new(
            NewActivity::new(activity_type, n.to_string(), format!("Item {}", n), at),
            at,
        )
    }

    struct Failing;

    #[async_trait]
    impl Summarizer for Failing {
        async fn summarize(&self, _: &[Activity], _: &WeekWindow) -> anyhow::Result<String> {
            anyhow::bail!("model unavailable")
        }
    }

    #[test]
    fn test_digest_groups_in_priority_order_and_caps() {
        let mut activities: Vec<Activity> =
            (0..7).map(|n| activity(ActivityType::GithubCommit, n)).collect();
        activities.push(activity(ActivityType::GithubRelease, 10));

        let text = DigestSummarizer { footer: None }.digest(&activities, &window());

        assert!(text.starts_with("# Weekly Update: January 15 - January 21, 2024"));
        assert!(text.contains("This week we had 8 activities"));
        let releases = text.find("## Releases").unwrap();
        let commits = text.find("## Development Activity").unwrap();
        assert!(releases < commits);
        assert!(text.contains("- Item 4"));
        assert!(!text.contains("- Item 5"));
        assert!(text.contains("- ...and 2 more"));
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let summarizer = FallbackSummarizer::new(Arc::new(Failing));
        let text = summarizer
            .summarize(&[activity(ActivityType::MatrixPost, 1)], &window())
            .await
            .unwrap();

        assert!(text.contains("## Community Updates"));
        assert!(text.contains("- Item 1"));
    }
}
