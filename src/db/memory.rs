// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store with the same semantics as the Firestore backend.
//!
//! Used by tests and dry runs. Activity uniqueness comes from the map's entry
//! API, so two racing inserts of the same key cannot both succeed.

use crate::db::{sort_window, ActivityStore};
use crate::error::{AppError, Result};
use crate::models::{Activity, NewActivity, NewPost, Platform, Post, PostingStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryDb {
    activities: Arc<DashMap<String, Activity>>,
    posts: Arc<RwLock<Vec<Post>>>,
    next_post_id: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a database error, as if the backend
    /// connection had been lost.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database("Memory store offline".to_string()));
        }
        Ok(())
    }

    /// Insert with an explicit ingestion time.
    pub fn insert_activity_at(&self, activity: &NewActivity, collected_at: DateTime<Utc>) -> Result<bool> {
        self.check_online()?;

        match self.activities.entry(activity.key()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Activity::from_new(activity.clone(), collected_at));
                Ok(true)
            }
        }
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn get_activity(&self, id: &str) -> Option<Activity> {
        self.activities.get(id).map(|entry| entry.value().clone())
    }

    /// Snapshot of all recorded posts, in insertion order.
    pub async fn posts(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }
}

#[async_trait]
impl ActivityStore for MemoryDb {
    async fn insert_activity(&self, activity: &NewActivity) -> Result<bool> {
        self.insert_activity_at(activity, Utc::now())
    }

    async fn record_post(&self, post: &NewPost) -> Result<Post> {
        self.check_online()?;

        let id = format!("post-{}", self.next_post_id.fetch_add(1, Ordering::SeqCst) + 1);
        let post = Post::from_new(id, post.clone());
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn newsworthy_since(
        &self,
        since: DateTime<Utc>,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<Activity>> {
        self.check_online()?;

        let posted: HashSet<String> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.platform == platform)
            .filter_map(|p| p.activity_id.clone())
            .collect();

        let mut candidates: Vec<Activity> = self
            .activities
            .iter()
            .filter(|entry| {
                let a = entry.value();
                a.is_newsworthy && a.created_at >= since && !posted.contains(&a.id)
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Id as tiebreaker so equal timestamps come back in a stable order
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn activities_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        self.check_online()?;

        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .filter(|entry| entry.value().created_at >= start && entry.value().created_at <= end)
            .map(|entry| entry.value().clone())
            .collect();

        sort_window(&mut activities);
        Ok(activities)
    }

    async fn last_post_time(&self, platform: Platform) -> Result<Option<DateTime<Utc>>> {
        self.check_online()?;

        Ok(self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.platform == platform)
            .map(|p| p.posted_at)
            .max())
    }

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<PostingStats> {
        self.check_online()?;

        let posts = self.posts.read().await;
        Ok(PostingStats::from_posts(
            posts.iter().filter(|p| p.posted_at >= since),
        ))
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}
