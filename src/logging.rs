// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives, applied on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: [&str; 2] = ["activity_herald=debug", "info"];

/// Install a JSON subscriber (GCP-compliant field layout).
///
/// Call once from the binary. Returns an error if a global subscriber is
/// already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(format)
        .try_init()?;

    Ok(())
}

fn env_filter() -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}
