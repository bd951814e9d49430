//! Event service implementation
//!
//! Host-facing event management and discovery reads. Every read path here
//! presents the effective status computed by `services::status`; the raw
//! stored value never leaves the service layer.

use chrono::Utc;
use tracing::{info, warn};

use crate::database::repositories::{
    EventRepository, ParticipantRepository, UserRepository,
};
use crate::models::event::{
    CreateEventRequest, Event, EventFilter, EventStatus, EventView, UpdateEventRequest,
};
use crate::services::notification::NotificationService;
use crate::services::status;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::calculate_offset;
use crate::utils::logging::log_status_transition;

const MAX_PAGE_SIZE: i64 = 100;

/// Event service for host CRUD and discovery
#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(
        events: EventRepository,
        participants: ParticipantRepository,
        users: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            events,
            participants,
            users,
            notifications,
        }
    }

    /// Create a new event
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event> {
        if request.title.trim().is_empty() {
            return Err(GatherlyError::InvalidInput(
                "Event title is required".to_string(),
            ));
        }

        if request.event_date <= Utc::now() {
            return Err(GatherlyError::InvalidInput(
                "Event date must be in the future".to_string(),
            ));
        }

        if request.max_participants < 1 {
            return Err(GatherlyError::InvalidInput(
                "Capacity must be at least 1".to_string(),
            ));
        }

        if request.price_cents < 0 {
            return Err(GatherlyError::InvalidInput(
                "Price cannot be negative".to_string(),
            ));
        }

        let host_id = request.host_id;
        self.users
            .find_by_id(host_id)
            .await?
            .ok_or(GatherlyError::UserNotFound { user_id: host_id })?;

        let event = self.events.create(request).await?;
        info!(event_id = event.id, host_id = host_id, "Event created");

        Ok(event)
    }

    /// Update an event's attributes. Host only; terminal events are frozen.
    pub async fn update_event(
        &self,
        actor_id: i64,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> Result<Event> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.host_id != actor_id {
            return Err(GatherlyError::PermissionDenied(
                "Only the host can update this event".to_string(),
            ));
        }

        if event.status.is_terminal() {
            return Err(GatherlyError::Rejected(format!(
                "Event can no longer be updated (status: {})",
                event.status
            )));
        }

        if let Some(date) = request.event_date {
            if date <= Utc::now() {
                return Err(GatherlyError::InvalidInput(
                    "Event date must be in the future".to_string(),
                ));
            }
        }

        if let Some(capacity) = request.max_participants {
            if capacity < 1 {
                return Err(GatherlyError::InvalidInput(
                    "Capacity must be at least 1".to_string(),
                ));
            }
        }

        if let Some(price) = request.price_cents {
            if price < 0 {
                return Err(GatherlyError::InvalidInput(
                    "Price cannot be negative".to_string(),
                ));
            }
        }

        let updated = self.events.update(event_id, request).await?;
        info!(event_id = event_id, actor_id = actor_id, "Event updated");

        Ok(updated)
    }

    /// Cancel an event. Host or admin; cancellation is terminal, and already
    /// terminal events are left untouched.
    pub async fn cancel_event(&self, actor_id: i64, event_id: i64) -> Result<Event> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.check_host_or_admin(actor_id, &event, "cancel").await?;

        if event.status.is_terminal() {
            return Err(GatherlyError::Rejected(format!(
                "Event can no longer be cancelled (status: {})",
                event.status
            )));
        }

        let cancelled = self.events.set_status(event_id, EventStatus::Cancelled).await?;
        log_status_transition(event_id, event.status.as_str(), "cancelled", "manual cancellation");
        info!(event_id = event_id, actor_id = actor_id, "Event cancelled");

        self.spawn_cancellation_notices(cancelled.clone());

        Ok(cancelled)
    }

    /// Delete an event entirely. Host or admin; participations and reviews
    /// cascade in storage.
    pub async fn delete_event(&self, actor_id: i64, event_id: i64) -> Result<()> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.check_host_or_admin(actor_id, &event, "delete").await?;

        self.events.delete(event_id).await?;
        info!(event_id = event_id, actor_id = actor_id, "Event deleted");

        Ok(())
    }

    /// Get one event with its effective status
    pub async fn get_event(&self, event_id: i64) -> Result<EventView> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        let count = self.participants.count_for_event(event_id).await?;

        Ok(status::into_view(event, count, Utc::now()))
    }

    /// List events with filters and pagination, presented with effective
    /// status
    pub async fn list_events(
        &self,
        filter: EventFilter,
        page: usize,
        page_size: i64,
    ) -> Result<Vec<EventView>> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = calculate_offset(page, page_size as usize) as i64;

        let events = self.events.list(&filter, page_size, offset).await?;
        self.into_views(events).await
    }

    /// List a host's own events, presented with effective status
    pub async fn get_host_events(&self, host_id: i64) -> Result<Vec<EventView>> {
        let events = self.events.get_host_events(host_id).await?;
        self.into_views(events).await
    }

    async fn into_views(&self, events: Vec<Event>) -> Result<Vec<EventView>> {
        let now = Utc::now();
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let counts = self.participants.count_for_events(&ids).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let count = counts
                    .iter()
                    .find(|(id, _)| *id == event.id)
                    .map(|(_, c)| *c)
                    .unwrap_or(0);
                status::into_view(event, count, now)
            })
            .collect())
    }

    async fn check_host_or_admin(&self, actor_id: i64, event: &Event, action: &str) -> Result<()> {
        if event.host_id == actor_id {
            return Ok(());
        }

        let actor = self
            .users
            .find_by_id(actor_id)
            .await?
            .ok_or(GatherlyError::UserNotFound { user_id: actor_id })?;

        if actor.is_admin() {
            return Ok(());
        }

        Err(GatherlyError::PermissionDenied(format!(
            "Only the host or an administrator can {} this event",
            action
        )))
    }

    /// Notify all current participants of a cancellation, off the critical
    /// path
    fn spawn_cancellation_notices(&self, event: Event) {
        let participants = self.participants.clone();
        let users = self.users.clone();
        let notifications = self.notifications.clone();

        tokio::spawn(async move {
            let joined = match participants.get_event_participants(event.id).await {
                Ok(joined) => joined,
                Err(e) => {
                    warn!(event_id = event.id, error = %e, "Cancellation notices skipped, participant lookup failed");
                    return;
                }
            };

            if joined.is_empty() {
                return;
            }

            let user_ids: Vec<i64> = joined.iter().map(|p| p.user_id).collect();
            match users.find_by_ids(&user_ids).await {
                Ok(recipients) => {
                    notifications.send_event_cancelled(&recipients, &event).await;
                }
                Err(e) => {
                    warn!(event_id = event.id, error = %e, "Cancellation notices skipped, user lookup failed");
                }
            }
        });
    }
}
