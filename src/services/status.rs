//! Effective event status resolution
//!
//! The stored status on an event row is authoritative for terminal states and
//! advisory for the live ones: between sweeper runs it can lag behind the
//! clock, and it never reflects the participant count by itself. Every read
//! path that presents a status to a caller goes through `resolve_status`;
//! nothing else in the codebase is allowed to inline this logic.

use chrono::{DateTime, Utc};

use crate::models::event::{Event, EventStatus, EventView};

/// Compute the effective status of an event.
///
/// Total over its inputs, no failure modes. Precedence, first match wins:
/// terminal stored status, then time expiry, then capacity, then open.
pub fn resolve_status(event: &Event, participant_count: i64, now: DateTime<Utc>) -> EventStatus {
    if event.status.is_terminal() {
        return event.status;
    }

    if event.event_date < now {
        return EventStatus::Completed;
    }

    if participant_count >= i64::from(event.max_participants) {
        return EventStatus::Full;
    }

    EventStatus::Open
}

/// Bundle an event with its count and resolved status for presentation
pub fn into_view(event: Event, participant_count: i64, now: DateTime<Utc>) -> EventView {
    let effective_status = resolve_status(&event, participant_count, now);
    EventView {
        event,
        participant_count,
        effective_status,
    }
}
