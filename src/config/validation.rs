//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::is_valid_email;

use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_mailer_config(&settings.mailer)?;
    validate_scheduler_config(&settings.scheduler)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GatherlyError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(GatherlyError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GatherlyError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate mail delivery configuration
fn validate_mailer_config(config: &super::MailerConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(GatherlyError::Config("Mail API URL is required".to_string()));
    }

    url::Url::parse(&config.api_url)?;

    if config.timeout_seconds == 0 {
        return Err(GatherlyError::Config(
            "Mail API timeout must be greater than 0".to_string(),
        ));
    }

    if !is_valid_email(&config.sender) {
        return Err(GatherlyError::Config(format!(
            "Invalid sender address: {}",
            config.sender
        )));
    }

    Ok(())
}

/// Validate scheduler configuration
fn validate_scheduler_config(config: &super::SchedulerConfig) -> Result<()> {
    if config.sweep_interval_seconds == 0 {
        return Err(GatherlyError::Config(
            "Sweep interval must be greater than 0".to_string(),
        ));
    }

    if config.reminder_interval_seconds == 0 {
        return Err(GatherlyError::Config(
            "Reminder interval must be greater than 0".to_string(),
        ));
    }

    if config.reminder_lookahead_hours <= 0 {
        return Err(GatherlyError::Config(
            "Reminder lookahead must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GatherlyError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GatherlyError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
