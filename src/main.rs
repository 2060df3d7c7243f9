//! Courier Planner - delivery slot estimation and route planning
//!
//! Serves the planner over HTTP, or answers one question from the command
//! line using the same data files.

mod cli;
mod config;
mod defaults;
mod error;
mod handlers;
mod services;
mod state;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::services::estimator::PredictionQuery;
use crate::state::AppState;
use crate::types::{ListResponse, StopSet};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Offline commands print JSON on stdout, so their console logs go to stderr
    let offline = !matches!(cli.command, None | Some(Command::Serve));

    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir =
        std::env::var("LOGS_DIR").unwrap_or_else(|_| defaults::DEFAULT_LOGS_DIR.to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let console = if offline {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let json_format = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let (plain_console, json_console) = if json_format {
        (None, Some(tracing_subscriber::fmt::layer().json().with_writer(console)))
    } else {
        (Some(tracing_subscriber::fmt::layer().with_writer(console)), None)
    };

    // Initialize logging - both console and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,courier_planner=debug".into()),
        ))
        .with(plain_console)
        .with(json_console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let state = AppState::new(config).context("failed to open planner data")?;

    match cli.command {
        None | Some(Command::Serve) => serve(Arc::new(state)).await,
        Some(Command::Predict { name, day, top_k }) => {
            let now = state.now();
            let day = match day {
                Some(day) => day.parse()?,
                None => state.today(),
            };
            let query = PredictionQuery {
                customer: name,
                day,
                top_k: top_k.filter(|k| *k > 0).unwrap_or(state.config.top_k),
                now,
            };
            print_json(&state.book.predict(&query, &mut rand::thread_rng()))
        }
        Some(Command::Route { names }) => {
            let stops = if names.is_empty() {
                state.book.todays_stops(&state.now())
            } else {
                StopSet::from_names(&names)
            };
            print_json(&state.optimizer.optimize(&stops)?)
        }
        Some(Command::Orders) => print_json(&ListResponse::new(state.book.list_pending())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.bind;
    let summary = state.book.summary();
    info!(
        "Starting Courier Planner on {} ({} pending orders, {} logged attempts)",
        addr, summary.pending, summary.attempts
    );

    let app = handlers::router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Courier Planner stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
