//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub mailer: MailerConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Mail delivery API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender: String,
    pub timeout_seconds: u64,
}

/// Background worker scheduling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Seconds between lifecycle sweeps
    pub sweep_interval_seconds: u64,
    /// Seconds between reminder dispatch runs
    pub reminder_interval_seconds: u64,
    /// How far ahead reminders look for upcoming events
    pub reminder_lookahead_hours: i64,
    /// Run one sweep immediately on startup to catch events that expired
    /// while the process was down
    pub sweep_on_start: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("GATHERLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::GatherlyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/gatherly".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            mailer: MailerConfig {
                api_url: "https://api.mail.example.com/v1/send".to_string(),
                api_key: String::new(),
                sender: "no-reply@gatherly.app".to_string(),
                timeout_seconds: 5,
            },
            scheduler: SchedulerConfig {
                sweep_interval_seconds: 3600,
                reminder_interval_seconds: 3600,
                reminder_lookahead_hours: 24,
                sweep_on_start: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/gatherly".to_string(),
            },
        }
    }
}
