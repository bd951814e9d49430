//! Participation service implementation
//!
//! All mutations of the join relationship go through this service. Join and
//! leave each run as a single transaction that first takes the event row lock,
//! so concurrent requests against the same event are serialized and the
//! participant count can never exceed the event's capacity.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::database::repositories::{EventRepository, ParticipantRepository, UserRepository};
use crate::models::event::{EventStatus, EventView};
use crate::models::participant::{JoinOutcome, Participant, ParticipationStatus, PaymentStatus};
use crate::services::notification::NotificationService;
use crate::services::status;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::generate_booking_ref;
use crate::utils::logging::{log_participation_action, log_status_transition};

const BOOKING_REF_LENGTH: usize = 8;

/// Participation service for join/leave operations and membership reads
#[derive(Clone)]
pub struct ParticipationService {
    pool: PgPool,
    events: EventRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl ParticipationService {
    /// Create a new ParticipationService instance
    pub fn new(
        pool: PgPool,
        events: EventRepository,
        participants: ParticipantRepository,
        users: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            events,
            participants,
            users,
            notifications,
        }
    }

    /// Join an event.
    ///
    /// Preconditions, checked in order — the first failing check determines
    /// the reported error: event exists, requester is not the host, stored
    /// status is open, no existing join record, a seat is free. The checks
    /// and the subsequent writes commit atomically; when the post-join count
    /// reaches capacity the stored status flips to full in the same
    /// transaction.
    ///
    /// The status check deliberately reads the stored value, so an expired
    /// event that has not been swept yet still accepts joins.
    pub async fn join_event(&self, user_id: i64, event_id: i64) -> Result<JoinOutcome> {
        debug!(user_id = user_id, event_id = event_id, "Join requested");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .find_by_id_for_update(&mut tx, event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.host_id == user_id {
            return Err(GatherlyError::Rejected(
                "You cannot join your own event".to_string(),
            ));
        }

        if event.status == EventStatus::Full {
            return Err(GatherlyError::Rejected("Event is full".to_string()));
        }

        if event.status != EventStatus::Open {
            return Err(GatherlyError::Rejected(format!(
                "Event is not open for registration (status: {})",
                event.status
            )));
        }

        if self
            .participants
            .exists_in_tx(&mut tx, event_id, user_id)
            .await?
        {
            return Err(GatherlyError::Rejected(
                "You have already joined this event".to_string(),
            ));
        }

        let count = self.participants.count_in_tx(&mut tx, event_id).await?;
        if count >= i64::from(event.max_participants) {
            return Err(GatherlyError::Rejected("Event is full".to_string()));
        }

        // Free events have nothing to collect; priced joins await the payment
        // collaborator's outcome
        let payment_status = if event.is_free() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        };

        let booking_ref = generate_booking_ref(BOOKING_REF_LENGTH);
        let participant = self
            .participants
            .insert_in_tx(&mut tx, event_id, user_id, payment_status, &booking_ref)
            .await?;

        let event = if count + 1 >= i64::from(event.max_participants) {
            self.events
                .set_status_in_tx(&mut tx, event_id, EventStatus::Full)
                .await?
        } else {
            event
        };

        tx.commit().await?;

        let details = format!("booking_ref={}", participant.booking_ref);
        log_participation_action(event_id, user_id, "join", Some(details.as_str()));
        if event.status == EventStatus::Full {
            log_status_transition(event_id, "open", "full", "capacity reached");
        }

        self.spawn_booking_confirmation(participant.clone(), event.clone());

        Ok(JoinOutcome { participant, event })
    }

    /// Leave an event.
    ///
    /// Deletes the join record; when the stored status was full the freed
    /// seat reverts it to open unconditionally, in the same transaction.
    pub async fn leave_event(&self, user_id: i64, event_id: i64) -> Result<()> {
        debug!(user_id = user_id, event_id = event_id, "Leave requested");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .find_by_id_for_update(&mut tx, event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        let deleted = self
            .participants
            .delete_in_tx(&mut tx, event_id, user_id)
            .await?;

        if !deleted {
            return Err(GatherlyError::ParticipantNotFound { user_id, event_id });
        }

        if event.status == EventStatus::Full {
            self.events
                .set_status_in_tx(&mut tx, event_id, EventStatus::Open)
                .await?;
        }

        tx.commit().await?;

        log_participation_action(event_id, user_id, "leave", None);
        if event.status == EventStatus::Full {
            log_status_transition(event_id, "full", "open", "seat freed");
        }

        Ok(())
    }

    /// Get all participants of an event
    pub async fn get_event_participants(&self, event_id: i64) -> Result<Vec<Participant>> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.participants.get_event_participants(event_id).await
    }

    /// Get the events a user has joined, presented with effective status.
    ///
    /// `upcoming`: Some(true) restricts to future events, Some(false) to past
    /// ones, None returns both.
    pub async fn get_user_joined_events(
        &self,
        user_id: i64,
        upcoming: Option<bool>,
    ) -> Result<Vec<EventView>> {
        let events = self.events.get_user_joined_events(user_id, upcoming).await?;
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

    /// Mark a participant's attendance. Host only, after the fact.
    pub async fn mark_attendance(
        &self,
        actor_id: i64,
        event_id: i64,
        user_id: i64,
        attended: bool,
    ) -> Result<Participant> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.host_id != actor_id {
            return Err(GatherlyError::PermissionDenied(
                "Only the host can record attendance".to_string(),
            ));
        }

        self.participants
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(GatherlyError::ParticipantNotFound { user_id, event_id })?;

        let participant = self.participants.set_attended(event_id, user_id, attended).await?;
        let details = attended.to_string();
        log_participation_action(event_id, user_id, "attendance", Some(details.as_str()));

        Ok(participant)
    }

    /// Check a user's membership in an event, with defaults when absent
    pub async fn check_participation(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<ParticipationStatus> {
        let participant = self
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?;

        Ok(match participant {
            Some(p) => ParticipationStatus {
                is_participant: true,
                joined_at: Some(p.joined_at),
                attended: p.attended,
            },
            None => ParticipationStatus::default(),
        })
    }

    /// Fire off the booking confirmation outside the transaction; delivery is
    /// best-effort and never affects the join that triggered it
    fn spawn_booking_confirmation(
        &self,
        participant: Participant,
        event: crate::models::event::Event,
    ) {
        let users = self.users.clone();
        let notifications = self.notifications.clone();

        tokio::spawn(async move {
            match users.find_by_id(participant.user_id).await {
                Ok(Some(user)) => {
                    if let Err(e) = notifications
                        .send_booking_confirmation(&user, &event, &participant)
                        .await
                    {
                        warn!(
                            user_id = participant.user_id,
                            event_id = event.id,
                            error = %e,
                            "Booking confirmation failed"
                        );
                    }
                }
                Ok(None) => {
                    warn!(
                        user_id = participant.user_id,
                        "Booking confirmation skipped, user not found"
                    );
                }
                Err(e) => {
                    warn!(
                        user_id = participant.user_id,
                        error = %e,
                        "Booking confirmation skipped, user lookup failed"
                    );
                }
            }
        });
    }
}
