// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod collection;
pub mod formatter;
pub mod publisher;
pub mod scheduler;
pub mod selection;
pub mod summarizer;

pub use collection::{CollectionRunner, Collector};
pub use formatter::{Formatter, PlainFormatter};
pub use publisher::Publisher;
pub use scheduler::{PlatformOutcome, TaskScheduler, WeeklyOutcome};
pub use selection::{PriorityTable, SelectionEngine};
pub use summarizer::{DigestSummarizer, FallbackSummarizer, Summarizer};
