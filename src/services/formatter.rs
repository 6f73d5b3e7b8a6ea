// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turning activities into platform-ready text.

use crate::models::{Activity, ActivityType, Platform};

/// Renders an activity for a platform.
pub trait Formatter: Send + Sync {
    fn format(&self, activity: &Activity, platform: Platform) -> anyhow::Result<String>;
}

/// Character limit per platform, `None` for unlimited.
pub fn platform_limit(platform: Platform) -> Option<usize> {
    match platform {
        Platform::Mastodon => Some(500),
        Platform::X => Some(280),
        Platform::Blog => None,
    }
}

/// Shorten `content` to `limit` characters including a trailing `...`.
///
/// Cuts at the last space when that keeps more than 80% of the limit,
/// otherwise mid-word.
pub fn truncate_to(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }

    let kept: String = content.chars().take(limit.saturating_sub(3)).collect();
    let cut = match kept.rfind(' ') {
        Some(pos) if kept[..pos].chars().count() * 5 > limit * 4 => &kept[..pos],
        _ => kept.as_str(),
    };

    format!("{}...", cut)
}

/// Template formatter: emoji, cleaned title, link and hashtags for social
/// platforms; a markdown section for the blog.
#[derive(Debug, Clone)]
pub struct PlainFormatter {
    /// Tag every post carries
    pub project_tag: String,
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self {
            project_tag: "#mwmbl".to_string(),
        }
    }
}

impl PlainFormatter {
    fn emoji(activity_type: ActivityType) -> &'static str {
        match activity_type {
            ActivityType::GithubRelease => "🚀",
            ActivityType::MwmblStats => "📊",
            ActivityType::MatrixPost => "💬",
            ActivityType::GithubPr => "🔀",
            ActivityType::GithubIssue => "🐛",
            ActivityType::GithubCommit => "📝",
        }
    }

    fn hashtags(&self, activity_type: ActivityType, max_tags: usize) -> Vec<&str> {
        let by_type: &[&str] = match activity_type {
            ActivityType::GithubRelease => &["#release", "#update"],
            ActivityType::MwmblStats => &["#stats", "#data"],
            ActivityType::MatrixPost => &["#community"],
            ActivityType::GithubPr => &["#development", "#pullrequest"],
            ActivityType::GithubIssue => &["#development", "#issue"],
            ActivityType::GithubCommit => &["#development", "#commit"],
        };

        std::iter::once(self.project_tag.as_str())
            .chain(by_type.iter().copied())
            .chain(["#searchengine", "#opensource"])
            .take(max_tags)
            .collect()
    }

    fn source_name(activity_type: ActivityType) -> &'static str {
        match activity_type {
            ActivityType::MatrixPost => "Matrix",
            ActivityType::MwmblStats => "Mwmbl",
            _ => "GitHub",
        }
    }

    fn social(&self, activity: &Activity, max_tags: usize, link_prefix: &str) -> String {
        let mut parts = vec![
            Self::emoji(activity.activity_type).to_string(),
            clean_title(&activity.title),
        ];
        if let Some(url) = &activity.url {
            parts.push(format!("{}{}", link_prefix, url));
        }
        let tags = self.hashtags(activity.activity_type, max_tags);
        if !tags.is_empty() {
            parts.push(tags.join(" "));
        }
        parts.join(" ")
    }

    fn blog(&self, activity: &Activity) -> String {
        let title = clean_title(&activity.title);
        let mut parts = vec![format!("### {}", title)];

        if !activity.content.is_empty() && activity.content != title {
            parts.push(activity.content.clone());
        }
        if let Some(author) = &activity.author {
            parts.push(format!("*By: {}*", author));
        }
        if let Some(url) = &activity.url {
            parts.push(format!(
                "[View on {}]({})",
                Self::source_name(activity.activity_type),
                url
            ));
        }

        parts.join("\n\n")
    }
}

impl Formatter for PlainFormatter {
    fn format(&self, activity: &Activity, platform: Platform) -> anyhow::Result<String> {
        let content = match platform {
            Platform::Mastodon => self.social(activity, 5, "\n🔗 "),
            Platform::X => self.social(activity, 2, ""),
            Platform::Blog => self.blog(activity),
        };

        Ok(match platform_limit(platform) {
            Some(limit) => truncate_to(&content, limit),
            None => content,
        })
    }
}

/// Collapse whitespace, drop markdown emphasis and PR/issue/commit prefixes.
fn clean_title(title: &str) -> String {
    let collapsed = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['*', '_', '`'], "");

    strip_reference_prefix(&collapsed).to_string()
}

fn strip_reference_prefix(title: &str) -> &str {
    if let Some(rest) = title.strip_prefix("Commit:") {
        return rest.trim_start();
    }

    for prefix in ["PR #", "Issue #"] {
        if let Some(rest) = title.strip_prefix(prefix) {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 {
                if let Some(after) = rest[digits..].strip_prefix(':') {
                    return after.trim_start();
                }
            }
        }
    }

    title
}
