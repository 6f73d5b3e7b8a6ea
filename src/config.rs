//! Application configuration loaded from environment variables.
//!
//! Built once at startup and handed to each component; nothing reads the
//! environment after that.

use crate::models::ActivityType;
use crate::services::selection::PriorityTable;
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted `MIN_POST_INTERVAL_HOURS`: anything from no cooldown to a year.
pub const MIN_POST_INTERVAL_RANGE: RangeInclusive<i64> = 0..=8760;

/// Accepted `RECENCY_BOOST_HOURS`.
pub const RECENCY_BOOST_RANGE: RangeInclusive<f64> = 0.0..=8760.0;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Bearer token expected on scheduler-triggered routes
    pub scheduler_token: String,

    // --- Posting policy ---
    /// Maximum activities posted per platform per daily run
    pub max_daily_posts: usize,
    /// Minimum hours between two posts to the same platform
    pub min_post_interval_hours: i64,
    /// Characters of content kept in stored post snapshots
    pub stored_content_limit: usize,
    /// Priority weights used to order daily candidates
    pub priorities: PriorityTable,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            scheduler_token: "test_scheduler_token".to_string(),
            max_daily_posts: 10,
            min_post_interval_hours: 1,
            stored_content_limit: 1000,
            priorities: PriorityTable::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `PRIORITY_WEIGHTS` takes `type=weight` pairs, e.g.
    /// `github_release=12,github_commit=1`; unlisted types keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mut priorities = PriorityTable::default();
        priorities.recency_boost_hours =
            parse_in_range("RECENCY_BOOST_HOURS", 5.0, RECENCY_BOOST_RANGE)?;
        if let Ok(raw) = env::var("PRIORITY_WEIGHTS") {
            for (activity_type, weight) in parse_priority_weights(&raw)? {
                priorities = priorities.with_weight(activity_type, weight);
            }
        }

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8080)?,
            scheduler_token: env::var("SCHEDULER_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SCHEDULER_TOKEN"))?,
            max_daily_posts: parse_var("MAX_DAILY_POSTS", 10)?,
            min_post_interval_hours: parse_in_range(
                "MIN_POST_INTERVAL_HOURS",
                1,
                MIN_POST_INTERVAL_RANGE,
            )?,
            stored_content_limit: parse_var("STORED_CONTENT_LIMIT", 1000)?,
            priorities,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], rejecting values outside `range`. NaN is never in range.
fn parse_in_range<T>(name: &'static str, default: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
{
    let value = parse_var(name, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_priority_weights(raw: &str) -> Result<Vec<(ActivityType, f64)>, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "PRIORITY_WEIGHTS",
        value: raw.to_string(),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, weight) = pair.split_once('=').ok_or_else(invalid)?;
            let activity_type = name.trim().parse().map_err(|_| invalid())?;
            let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
            if !weight.is_finite() {
                return Err(invalid());
            }
            Ok((activity_type, weight))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("SCHEDULER_TOKEN", " secret-token ");
        env::set_var("MAX_DAILY_POSTS", "3");
        env::set_var("PRIORITY_WEIGHTS", "github_commit=9");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.scheduler_token, "secret-token");
        assert_eq!(config.max_daily_posts, 3);
        assert_eq!(config.min_post_interval_hours, 1);
        assert_eq!(config.stored_content_limit, 1000);
        assert_eq!(config.priorities.base_priority(ActivityType::GithubCommit), 9.0);
        assert_eq!(config.priorities.base_priority(ActivityType::GithubRelease), 10.0);

        env::remove_var("MAX_DAILY_POSTS");
        env::remove_var("PRIORITY_WEIGHTS");
    }

    #[test]
    fn test_parse_priority_weights() {
        let weights = parse_priority_weights("github_release=12, matrix_post=3.5,").unwrap();
        assert_eq!(
            weights,
            vec![
                (ActivityType::GithubRelease, 12.0),
                (ActivityType::MatrixPost, 3.5)
            ]
        );

        assert!(parse_priority_weights("github_release").is_err());
        assert!(parse_priority_weights("unknown=1").is_err());
        assert!(parse_priority_weights("github_pr=high").is_err());
        assert!(parse_priority_weights("github_pr=NaN").is_err());
        assert!(parse_priority_weights("github_pr=inf").is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        // Variable names private to this test so parallel tests don't race
        env::set_var("HERALD_TEST_INTERVAL_HOURS", "9000000000000");
        assert!(matches!(
            parse_in_range("HERALD_TEST_INTERVAL_HOURS", 1, MIN_POST_INTERVAL_RANGE),
            Err(ConfigError::Invalid { name: "HERALD_TEST_INTERVAL_HOURS", .. })
        ));

        env::set_var("HERALD_TEST_INTERVAL_HOURS", "-1");
        assert!(parse_in_range("HERALD_TEST_INTERVAL_HOURS", 1, MIN_POST_INTERVAL_RANGE).is_err());

        env::set_var("HERALD_TEST_INTERVAL_HOURS", "24");
        assert_eq!(
            parse_in_range("HERALD_TEST_INTERVAL_HOURS", 1, MIN_POST_INTERVAL_RANGE).unwrap(),
            24
        );
        env::remove_var("HERALD_TEST_INTERVAL_HOURS");

        for bad in ["NaN", "-0.5", "inf"] {
            env::set_var("HERALD_TEST_BOOST_HOURS", bad);
            assert!(
                parse_in_range("HERALD_TEST_BOOST_HOURS", 5.0, RECENCY_BOOST_RANGE).is_err(),
                "{} accepted",
                bad
            );
        }
        env::remove_var("HERALD_TEST_BOOST_HOURS");
        assert_eq!(
            parse_in_range("HERALD_TEST_BOOST_HOURS", 5.0, RECENCY_BOOST_RANGE).unwrap(),
            5.0
        );
    }
}
