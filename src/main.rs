// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Herald server and task runner.
//!
//! `serve` (the default) exposes the scheduler-triggered HTTP endpoints. The
//! other commands run a single task against Firestore, print its result as
//! JSON and exit non-zero when the task failed.
//!
//! Collectors and publishers are registered here; a deployment without any
//! still serves health, stats and connection checks.

use activity_herald::{
    config::Config,
    db::{ActivityStore, FirestoreDb},
    logging::init_logging,
    services::TaskScheduler,
    AppState,
};
use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "activity-herald")]
#[command(about = "Collect project activity and publish it")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP trigger endpoints
    Serve,

    /// Run every collector once
    Collect {
        /// Look back this many hours
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },

    /// Run the daily posting cycle
    Daily,

    /// Publish this week's summary
    Weekly,

    /// Show posting statistics
    Stats {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Check publisher and database connectivity
    TestConnections,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;

    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .context("Failed to connect to Firestore")?;
    let store: Arc<dyn ActivityStore> = Arc::new(db);
    let scheduler = TaskScheduler::new(&config, store);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(config, scheduler).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Collect { hours } => {
            let since = Utc::now() - Duration::hours(i64::from(hours));
            let collected = scheduler.run_data_collection(Some(since)).await;
            report(&serde_json::json!({ "collected": collected }), true)
        }
        Command::Daily => {
            let platforms = scheduler.run_daily_posting().await;
            let success = platforms.values().all(|outcome| outcome.is_success());
            report(&platforms, success)
        }
        Command::Weekly => {
            let outcome = scheduler.run_weekly_posting().await;
            let success = outcome.is_success();
            report(&outcome, success)
        }
        Command::Stats { days } => {
            let stats = scheduler.get_posting_stats(days).await?;
            report(&stats, true)
        }
        Command::TestConnections => {
            let results = scheduler.test_all_connections().await;
            let success = results.values().all(|connected| *connected);
            report(&results, success)
        }
    }
}

async fn serve(config: Config, scheduler: TaskScheduler) -> anyhow::Result<()> {
    tracing::info!(port = config.port, "Starting Activity Herald");

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState { config, scheduler });
    let app = activity_herald::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn report<T: Serialize>(result: &T, success: bool) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
