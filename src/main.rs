//! Ledger Cache - demo host
//!
//! Runs one cache per read path (dashboards, reports, quotes), drives a
//! simulated cache-aside workload against them and logs their statistics
//! until interrupted.

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_cache::{keys, Cache, Config};

/// Users simulated by the workload.
const USERS: u32 = 25;

/// Interval between workload rounds.
const ROUND_INTERVAL: Duration = Duration::from_millis(500);

/// Interval between statistics reports.
const STATS_INTERVAL: Duration = Duration::from_secs(5);

struct Caches {
    dashboards: Cache<Value>,
    reports: Cache<Value>,
    quotes: Cache<Value>,
}

/// Main entry point for the demo host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create one cache per subsystem (each starts its own reaper)
/// 4. Run workload rounds and periodic stats reports
/// 5. Destroy every cache on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ledger cache demo host");

    let config = Config::from_env().context("failed to load cache configuration")?;
    info!(
        capacity = config.capacity,
        default_ttl_ms = config.default_ttl.as_millis() as u64,
        reaper_interval = ?config.reaper_interval,
        "Configuration loaded"
    );

    let caches = Caches {
        dashboards: Cache::new(config.clone()),
        reports: Cache::new(config.clone()),
        quotes: Cache::new(config),
    };

    let mut round_timer = tokio::time::interval(ROUND_INTERVAL);
    let mut stats_timer = tokio::time::interval(STATS_INTERVAL);
    let mut round: u64 = 0;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = round_timer.tick() => {
                round += 1;
                run_round(&caches, round).await;
            }
            _ = stats_timer.tick() => report_stats(&caches).await?,
        }
    }

    report_stats(&caches).await?;
    caches.dashboards.destroy().await;
    caches.reports.destroy().await;
    caches.quotes.destroy().await;

    info!("Shutdown complete");
    Ok(())
}

/// One workload round: dashboard and report reads for a rotating user, a
/// quote lookup, and a simulated write that invalidates the user's keys.
async fn run_round(caches: &Caches, round: u64) {
    let user_id = (round % u64::from(USERS)) as u32;
    let today = Utc::now().date_naive();

    let dashboard = caches
        .dashboards
        .get_or_set(
            &keys::dashboard(user_id),
            || async move { load_dashboard(user_id).await },
            None,
        )
        .await;
    if let Err(err) = dashboard {
        warn!(user_id, error = %err, "Dashboard computation failed");
    }

    let month = first_of_month(today);
    let report = caches
        .reports
        .get_or_set_shared(
            &keys::report(user_id, "cashflow", month),
            || async move { build_report(user_id, month).await },
            Some(Duration::from_secs(600)),
        )
        .await;
    if let Err(err) = report {
        warn!(user_id, error = %err, "Report generation failed");
    }

    let quote = caches
        .quotes
        .get_or_set_with(
            &keys::exchange_rate("usd", "eur"),
            || Ok::<_, String>(json!({ "rate": 0.92, "as_of": today.to_string() })),
            Some(Duration::from_secs(60)),
        )
        .await;
    if let Err(err) = quote {
        warn!(error = %err, "Quote lookup failed");
    }

    // Every seventh round the user records a transaction
    if round % 7 == 0 {
        let mut removed = 0;
        for pattern in keys::user_patterns(user_id) {
            removed += caches.dashboards.invalidate_pattern(&pattern).await;
            removed += caches.reports.invalidate_pattern(&pattern).await;
        }
        info!(user_id, removed, "Invalidated user caches after write");
    }
}

async fn report_stats(caches: &Caches) -> anyhow::Result<()> {
    let snapshot = json!({
        "dashboards": caches.dashboards.get_stats().await,
        "reports": caches.reports.get_stats().await,
        "quotes": caches.quotes.get_stats().await,
    });
    info!(stats = %serde_json::to_string(&snapshot)?, "Cache statistics");
    Ok(())
}

// == Simulated Collaborators ==

async fn load_dashboard(user_id: u32) -> Result<Value, String> {
    tokio::time::sleep(Duration::from_millis(40)).await;
    Ok(json!({
        "user_id": user_id,
        "balance": f64::from(user_id) * 125.5,
        "accounts": user_id % 4 + 1,
    }))
}

async fn build_report(user_id: u32, month: NaiveDate) -> Result<Value, String> {
    tokio::time::sleep(Duration::from_millis(120)).await;
    Ok(json!({
        "user_id": user_id,
        "month": month.format("%Y-%m").to_string(),
        "income": 3000,
        "expenses": 1800 + user_id * 10,
    }))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
