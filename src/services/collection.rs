// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Source collection: run every collector and store what it finds.

use crate::db::ActivityStore;
use crate::models::NewActivity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use std::sync::Arc;

/// Collectors run against different sources and share nothing but the store,
/// so a few may be in flight at once.
const MAX_CONCURRENT_COLLECTORS: usize = 4;

/// A source of activities (GitHub, chat rooms, stats endpoints...).
///
/// Implementations bound their own network timeouts.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Activities created since `since` (everything available when `None`).
    async fn collect(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<Vec<NewActivity>>;
}

/// Runs collectors with per-collector failure isolation.
#[derive(Clone)]
pub struct CollectionRunner {
    store: Arc<dyn ActivityStore>,
    collectors: Vec<Arc<dyn Collector>>,
}

impl CollectionRunner {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self {
            store,
            collectors: Vec::new(),
        }
    }

    pub fn add_collector(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    pub fn collector_count(&self) -> usize {
        self.collectors.len()
    }

    /// Run every collector and return the number of newly stored activities.
    ///
    /// Duplicates are not counted. A collector that fails, or whose insert
    /// fails, is logged and skipped; activities it stored before the failure
    /// still count.
    pub async fn run_all(&self, since: Option<DateTime<Utc>>) -> usize {
        tracing::info!(
            collectors = self.collector_count(),
            since = ?since,
            "Starting data collection"
        );

        let runs: Vec<_> = self
            .collectors
            .iter()
            .map(|collector| self.run_one(collector.as_ref(), since))
            .collect();

        let total: usize = stream::iter(runs)
            .buffer_unordered(MAX_CONCURRENT_COLLECTORS)
            .fold(0, |total, inserted| async move { total + inserted })
            .await;

        tracing::info!(total, "Data collection completed");
        total
    }

    async fn run_one(&self, collector: &dyn Collector, since: Option<DateTime<Utc>>) -> usize {
        let name = collector.name();

        let activities = match collector.collect(since).await {
            Ok(activities) => activities,
            Err(e) => {
                tracing::error!(collector = name, error = %e, "Collector failed");
                return 0;
            }
        };

        let found = activities.len();
        let mut inserted = 0;

        for activity in &activities {
            match self.store.insert_activity(activity).await {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        collector = name,
                        activity_id = %activity.key(),
                        error = %e,
                        "Failed to store activity, abandoning batch"
                    );
                    break;
                }
            }
        }

        tracing::info!(
            collector = name,
            found,
            inserted,
            duplicates = found.saturating_sub(inserted),
            "Collector finished"
        );

        inserted
    }
}
