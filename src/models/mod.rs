// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod post;
pub mod stats;

pub use activity::{activity_key, Activity, ActivityType, NewActivity};
pub use post::{NewPost, Platform, Post};
pub use stats::PostingStats;
