//! Participant (join record) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment state of a join record. Only meaningful for priced events; free
/// joins are recorded as completed with no amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One seat in an event's capacity. At most one record exists per
/// (event, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub joined_at: DateTime<Utc>,
    pub attended: bool,
    pub payment_status: PaymentStatus,
    pub amount_paid_cents: Option<i64>,
    /// Reference assigned by the external payment provider
    pub payment_ref: Option<String>,
    pub booking_ref: String,
}

/// Result of a successful join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub participant: Participant,
    pub event: crate::models::event::Event,
}

/// Membership summary returned by participation checks; defaults to a
/// non-participant when no record exists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipationStatus {
    pub is_participant: bool,
    pub joined_at: Option<DateTime<Utc>>,
    pub attended: bool,
}

/// Terminal payment outcome delivered by the payment collaborator.
/// Delivery is at-least-once; handling must be idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub outcome: PaymentOutcomeKind,
    pub user_id: i64,
    pub event_id: i64,
    pub amount_cents: i64,
    pub payment_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcomeKind {
    Success,
    Failure,
}
