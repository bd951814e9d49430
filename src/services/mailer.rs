//! Mail delivery API client
//!
//! This module wraps the outbound HTTP mail provider: client setup, request
//! shaping, response parsing, and error handling. Every request carries an
//! idempotency key so provider-side retries cannot duplicate a message.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MailerConfig;
use crate::utils::errors::{GatherlyError, MailError, MailResult, Result};

/// Outbound message payload accepted by the mail API
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Delivery receipt returned by the mail API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailReceipt {
    pub id: String,
    #[serde(default)]
    pub queued: bool,
}

/// HTTP client for the mail delivery API
#[derive(Debug, Clone)]
pub struct MailerClient {
    client: Client,
    config: MailerConfig,
}

impl MailerClient {
    /// Create a new MailerClient instance
    pub fn new(config: MailerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Gatherly/1.0")
            .build()
            .map_err(GatherlyError::Http)?;

        Ok(Self { client, config })
    }

    /// Sender address messages go out under
    pub fn sender(&self) -> &str {
        &self.config.sender
    }

    /// Deliver one message
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> MailResult<MailReceipt> {
        let message = MailMessage {
            from: self.config.sender.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        debug!(to = %to, subject = %subject, "Sending mail");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("X-Idempotency-Key", Uuid::new_v4().to_string())
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailError::Timeout
                } else {
                    MailError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_server_error() || status.as_u16() == 429 {
            warn!(status = %status, "Mail API unavailable");
            return Err(MailError::ServiceUnavailable);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::RequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        response
            .json::<MailReceipt>()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))
    }
}
