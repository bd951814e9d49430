//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Gatherly application.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard must be held for the lifetime of the process; dropping
/// it stops the background writer and loses buffered log lines.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "gatherly.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log participation changes with structured data
pub fn log_participation_action(event_id: i64, user_id: i64, action: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        details = details,
        "Participation action performed"
    );
}

/// Log event lifecycle transitions
pub fn log_status_transition(event_id: i64, from: &str, to: &str, reason: &str) {
    info!(
        event_id = event_id,
        from = from,
        to = to,
        reason = reason,
        "Event status transition"
    );
}

/// Log payment reconciliation outcomes
pub fn log_payment_outcome(event_id: i64, user_id: i64, outcome: &str, payment_ref: &str) {
    if outcome == "failure" {
        warn!(
            event_id = event_id,
            user_id = user_id,
            payment_ref = payment_ref,
            "Payment failed"
        );
    } else {
        info!(
            event_id = event_id,
            user_id = user_id,
            payment_ref = payment_ref,
            "Payment completed"
        );
    }
}

/// Log sweeper runs
pub fn log_sweep_result(swept: u64, duration_ms: u64) {
    if swept > 0 {
        info!(swept = swept, duration_ms = duration_ms, "Lifecycle sweep completed");
    } else {
        debug!(duration_ms = duration_ms, "Lifecycle sweep found nothing to do");
    }
}
