//! Notification service implementation
//!
//! This service handles message formatting and sending: template rendering,
//! bulk dispatch with per-recipient failure isolation, delivery statistics,
//! and integration with the mail delivery client.
//!
//! Notifications are best-effort everywhere: callers fire them off the
//! critical path and a failed send never propagates to the operation that
//! triggered it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::event::Event;
use crate::models::participant::Participant;
use crate::models::user::User;
use crate::services::mailer::MailerClient;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::{format_price, format_timestamp, truncate_text};

/// Message template structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub key: String,
    pub subject: String,
    pub body: String,
}

/// Notification request structure
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub recipient: String,
    pub template_key: String,
    pub parameters: HashMap<String, String>,
}

/// Notification statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_failed: u64,
    pub sent_by_template: HashMap<String, u64>,
}

/// Notification service for message handling
#[derive(Clone)]
pub struct NotificationService {
    mailer: MailerClient,
    templates: HashMap<String, MessageTemplate>,
    stats: Arc<Mutex<NotificationStats>>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(mailer: MailerClient) -> Self {
        Self {
            mailer,
            templates: Self::load_default_templates(),
            stats: Arc::new(Mutex::new(NotificationStats::default())),
        }
    }

    /// Send a notification using a template
    pub async fn send_notification(&self, request: NotificationRequest) -> Result<()> {
        debug!(recipient = %request.recipient, template_key = %request.template_key, "Sending notification");

        let (subject, body) = self.render(&request.template_key, &request.parameters)?;

        match self.mailer.send(&request.recipient, &subject, &body).await {
            Ok(receipt) => {
                self.record_success(&request.template_key);
                info!(
                    recipient = %request.recipient,
                    template_key = %request.template_key,
                    message_id = %receipt.id,
                    "Notification sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                self.record_failure();
                warn!(
                    recipient = %request.recipient,
                    template_key = %request.template_key,
                    error = %e,
                    "Failed to send notification"
                );
                Err(GatherlyError::Mail(e))
            }
        }
    }

    /// Send the same templated notification to many recipients.
    ///
    /// Each recipient is isolated: one failed delivery is logged and the rest
    /// of the batch proceeds. Returns the number of successful sends.
    pub async fn send_bulk(
        &self,
        recipients: &[String],
        template_key: &str,
        parameters: HashMap<String, String>,
    ) -> u64 {
        info!(count = recipients.len(), template_key = %template_key, "Sending bulk notifications");

        let sends = recipients.iter().map(|recipient| {
            self.send_notification(NotificationRequest {
                recipient: recipient.clone(),
                template_key: template_key.to_string(),
                parameters: parameters.clone(),
            })
        });

        let results = futures::future::join_all(sends).await;
        let sent = results.iter().filter(|r| r.is_ok()).count() as u64;

        info!(
            total = recipients.len(),
            successful = sent,
            template_key = %template_key,
            "Bulk notifications completed"
        );
        sent
    }

    /// Send a booking confirmation after a successful join
    pub async fn send_booking_confirmation(
        &self,
        user: &User,
        event: &Event,
        participant: &Participant,
    ) -> Result<()> {
        let mut parameters = self.event_parameters(event);
        parameters.insert("display_name".to_string(), user.display_name.clone());
        parameters.insert("booking_ref".to_string(), participant.booking_ref.clone());

        self.send_notification(NotificationRequest {
            recipient: user.email.clone(),
            template_key: "booking_confirmation".to_string(),
            parameters,
        })
        .await
    }

    /// Send an upcoming-event reminder to a batch of participants
    pub async fn send_event_reminder(&self, users: &[User], event: &Event) -> u64 {
        let parameters = self.event_parameters(event);
        let recipients: Vec<String> = users.iter().map(|u| u.email.clone()).collect();

        self.send_bulk(&recipients, "event_reminder", parameters).await
    }

    /// Notify participants that an event was cancelled
    pub async fn send_event_cancelled(&self, users: &[User], event: &Event) -> u64 {
        let parameters = self.event_parameters(event);
        let recipients: Vec<String> = users.iter().map(|u| u.email.clone()).collect();

        self.send_bulk(&recipients, "event_cancelled", parameters).await
    }

    /// Get notification statistics
    pub fn get_stats(&self) -> NotificationStats {
        self.stats.lock().expect("stats lock poisoned").clone()
    }

    /// Add or replace a message template
    pub fn add_template(&mut self, template: MessageTemplate) {
        self.templates.insert(template.key.clone(), template);
    }

    fn event_parameters(&self, event: &Event) -> HashMap<String, String> {
        let mut parameters = HashMap::new();
        parameters.insert("event_title".to_string(), event.title.clone());
        parameters.insert("event_date".to_string(), format_timestamp(event.event_date));
        parameters.insert("event_location".to_string(), event.location.clone());
        parameters.insert("event_price".to_string(), format_price(event.price_cents));

        if let Some(description) = &event.description {
            parameters.insert(
                "event_description".to_string(),
                truncate_text(description, 280),
            );
        } else {
            parameters.insert("event_description".to_string(), String::new());
        }

        parameters
    }

    /// Render subject and body from a template and parameters
    fn render(
        &self,
        template_key: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<(String, String)> {
        let template = self.templates.get(template_key).ok_or_else(|| {
            GatherlyError::InvalidInput(format!("Template not found: {}", template_key))
        })?;

        let mut subject = template.subject.clone();
        let mut body = template.body.clone();

        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            subject = subject.replace(&placeholder, value);
            body = body.replace(&placeholder, value);
        }

        Ok((subject, body))
    }

    fn record_success(&self, template_key: &str) {
        let mut stats = self.stats.lock().expect("stats lock poisoned");
        stats.total_sent += 1;
        *stats
            .sent_by_template
            .entry(template_key.to_string())
            .or_insert(0) += 1;
    }

    fn record_failure(&self) {
        let mut stats = self.stats.lock().expect("stats lock poisoned");
        stats.total_failed += 1;
    }

    /// Load default message templates
    fn load_default_templates() -> HashMap<String, MessageTemplate> {
        let templates = [
            MessageTemplate {
                key: "booking_confirmation".to_string(),
                subject: "You're in: {event_title}".to_string(),
                body: "Hi {display_name},\n\nYour spot for {event_title} is confirmed.\n\nWhen: {event_date}\nWhere: {event_location}\nPrice: {event_price}\nBooking reference: {booking_ref}\n\nSee you there!".to_string(),
            },
            MessageTemplate {
                key: "event_reminder".to_string(),
                subject: "Reminder: {event_title} is coming up".to_string(),
                body: "{event_title} starts at {event_date}.\n\nWhere: {event_location}\n\n{event_description}".to_string(),
            },
            MessageTemplate {
                key: "event_cancelled".to_string(),
                subject: "Cancelled: {event_title}".to_string(),
                body: "Unfortunately {event_title} on {event_date} has been cancelled by the host.\n\nAny completed payment will be refunded.".to_string(),
            },
        ];

        templates
            .into_iter()
            .map(|t| (t.key.clone(), t))
            .collect()
    }
}
