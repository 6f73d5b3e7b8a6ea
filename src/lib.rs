// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity Herald: collect project activity and publish it.
//!
//! Collectors discover activities (releases, pull requests, chat posts,
//! statistics), the store deduplicates them, and the scheduler posts a
//! throttled, prioritized selection to social platforms each day and a
//! summary article to the blog each week.
//!
//! Collectors, publishers and summarizers are supplied by the embedding
//! binary through the traits in [`services`].

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::TaskScheduler;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub scheduler: TaskScheduler,
}
