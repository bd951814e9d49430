//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored lifecycle status of an event.
///
/// Only the persisted value; what callers see is the effective status computed
/// by `services::status::resolve_status`, which reconciles this with the clock
/// and the live participant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Full,
    Cancelled,
    Completed,
}

impl EventStatus {
    /// Terminal statuses are never overwritten by automated transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Full => "full",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: DateTime<Utc>,
    pub max_participants: i32,
    /// Price in cents; 0 means free
    pub price_cents: i64,
    pub status: EventStatus,
    pub host_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }
}

/// Event together with its live participant count and the effective status
/// derived from it. This is what every read path returns to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub participant_count: i64,
    pub effective_status: EventStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: DateTime<Utc>,
    pub max_participants: i32,
    pub price_cents: i64,
    pub host_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: Option<DateTime<Utc>>,
    pub max_participants: Option<i32>,
    pub price_cents: Option<i64>,
}

/// Filters accepted by the event listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    /// When false (default), events whose date has passed are excluded
    pub include_past: bool,
}
