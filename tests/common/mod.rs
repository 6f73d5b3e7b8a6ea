// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use activity_herald::config::Config;
use activity_herald::db::{FirestoreDb, MemoryDb};
use activity_herald::models::{ActivityType, NewActivity, Platform};
use activity_herald::routes::create_router;
use activity_herald::services::{Collector, Publisher, TaskScheduler};
use activity_herald::time_utils::WeekWindow;
use activity_herald::AppState;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Wednesday, mid-week, mid-day.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - Duration::hours(hours)
}

/// Newsworthy activity created `age_hours` before [`now`].
pub fn newsworthy(activity_type: ActivityType, source_id: &str, age_hours: i64) -> NewActivity {
    NewActivity::new(
        activity_type,
        source_id,
        format!("{} {}", activity_type.label(), source_id),
        hours_ago(age_hours),
    )
    .with_url(format!("https://github.com/mwmbl/mwmbl/{}", source_id))
    .newsworthy(true)
}

/// Store `activities` as if collected at [`now`].
pub fn seed(db: &MemoryDb, activities: &[NewActivity]) {
    for activity in activities {
        db.insert_activity_at(activity, now()).expect("seed insert");
    }
}

// ─── Collectors ──────────────────────────────────────────────────

/// Collector returning a fixed batch, or failing.
pub struct MockCollector {
    pub name: String,
    pub items: Vec<NewActivity>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockCollector {
    pub fn returning(name: &str, items: Vec<NewActivity>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            items,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            items: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Collector for MockCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self, _since: Option<DateTime<Utc>>) -> anyhow::Result<Vec<NewActivity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("{}: upstream returned 503", self.name);
        }
        Ok(self.items.clone())
    }
}

// ─── Publishers ──────────────────────────────────────────────────

/// How a mock publisher answers `publish`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublishMode {
    /// Return sequential ids `<prefix>-1`, `<prefix>-2`...
    Succeed,
    /// Return `Ok(None)`
    NoId,
    /// Return an error
    Fail,
}

/// Publisher that records everything it is asked to publish.
pub struct MockPublisher {
    prefix: String,
    mode: Mutex<PublishMode>,
    /// Fail only the n-th publish call (1-based)
    fail_call: Option<usize>,
    connected: Option<bool>,
    calls: AtomicUsize,
    pub published: Mutex<Vec<String>>,
    pub weekly: Mutex<Vec<(String, WeekWindow)>>,
}

impl MockPublisher {
    pub fn new(prefix: &str, mode: PublishMode) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.to_string(),
            mode: Mutex::new(mode),
            fail_call: None,
            connected: Some(true),
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            weekly: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(prefix: &str) -> Arc<Self> {
        Self::new(prefix, PublishMode::Succeed)
    }

    /// Succeeds except for call number `n`.
    pub fn failing_call(prefix: &str, n: usize) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.to_string(),
            mode: Mutex::new(PublishMode::Succeed),
            fail_call: Some(n),
            connected: Some(true),
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            weekly: Mutex::new(Vec::new()),
        })
    }

    /// `test_connection` result; `None` makes it return an error.
    pub fn with_connection(prefix: &str, connected: Option<bool>) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.to_string(),
            mode: Mutex::new(PublishMode::Succeed),
            fail_call: None,
            connected,
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            weekly: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: PublishMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }

    fn respond(&self, content: &str) -> anyhow::Result<Option<String>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_call == Some(n) {
            anyhow::bail!("{}: call {} rejected", self.prefix, n);
        }

        match *self.mode.lock().unwrap() {
            PublishMode::Succeed => {
                self.published.lock().unwrap().push(content.to_string());
                Ok(Some(format!("{}-{}", self.prefix, n)))
            }
            PublishMode::NoId => Ok(None),
            PublishMode::Fail => anyhow::bail!("{}: service unavailable", self.prefix),
        }
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, content: &str) -> anyhow::Result<Option<String>> {
        self.respond(content)
    }

    async fn publish_weekly_summary(
        &self,
        summary: &str,
        window: &WeekWindow,
    ) -> anyhow::Result<Option<String>> {
        self.weekly
            .lock()
            .unwrap()
            .push((summary.to_string(), *window));
        self.respond(summary)
    }

    async fn test_connection(&self) -> anyhow::Result<bool> {
        self.connected
            .ok_or_else(|| anyhow::anyhow!("{}: DNS failure", self.prefix))
    }
}

/// Mastodon, X and blog mocks, all succeeding.
pub struct Publishers {
    pub mastodon: Arc<MockPublisher>,
    pub x: Arc<MockPublisher>,
    pub blog: Arc<MockPublisher>,
}

impl Publishers {
    pub fn ok() -> Self {
        Self {
            mastodon: MockPublisher::ok("toot"),
            x: MockPublisher::ok("tweet"),
            blog: MockPublisher::ok("article"),
        }
    }

    pub fn register(&self, scheduler: TaskScheduler) -> TaskScheduler {
        scheduler
            .with_publisher(Platform::Mastodon, self.mastodon.clone())
            .with_publisher(Platform::X, self.x.clone())
            .with_publisher(Platform::Blog, self.blog.clone())
    }
}

/// Scheduler over an in-memory store with all three mock publishers.
pub fn test_scheduler(db: &MemoryDb, publishers: &Publishers) -> TaskScheduler {
    publishers.register(TaskScheduler::new(
        &Config::test_default(),
        Arc::new(db.clone()),
    ))
}

/// Create a test app over an in-memory store with succeeding publishers.
/// Returns the router, the shared state and the store.
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with(Publishers::ok())
}

pub fn create_test_app_with(publishers: Publishers) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let config = Config::test_default();
    let db = MemoryDb::new();
    let scheduler = test_scheduler(&db, &publishers);

    let state = Arc::new(AppState { config, scheduler });

    (create_router(state.clone()), state, db)
}

/// `Authorization` header value accepted by the test app.
pub fn bearer(config: &Config) -> String {
    format!("Bearer {}", config.scheduler_token)
}
