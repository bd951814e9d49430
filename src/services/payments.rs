//! Payment outcome reconciliation
//!
//! The payment collaborator reports terminal outcomes out-of-band, with
//! at-least-once delivery. Reconciliation shares the participation
//! transaction discipline: the event row lock is taken before the join record
//! is touched, and the success path is an upsert keyed on the unique
//! (event, user) pair so redelivery cannot double-count a seat.

use tracing::{info, warn};

use sqlx::PgPool;

use crate::database::repositories::{EventRepository, ParticipantRepository, UserRepository};
use crate::models::event::EventStatus;
use crate::models::participant::{Participant, PaymentOutcome, PaymentOutcomeKind};
use crate::services::notification::NotificationService;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::generate_booking_ref;
use crate::utils::logging::log_payment_outcome;

const BOOKING_REF_LENGTH: usize = 8;

/// Payment reconciliation service
#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    events: EventRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl PaymentService {
    /// Create a new PaymentService instance
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

    /// Apply a terminal payment outcome to participation state.
    ///
    /// Success upserts the join record with a completed payment — the only
    /// path besides `join_event` that can create one, used when payment
    /// precedes seat reservation — then re-checks capacity and flips the
    /// stored status to full when reached. Failure marks an existing record
    /// failed; it neither deletes the record nor frees the seat.
    pub async fn reconcile_payment_outcome(&self, outcome: PaymentOutcome) -> Result<()> {
        match outcome.outcome {
            PaymentOutcomeKind::Success => self.apply_success(outcome).await,
            PaymentOutcomeKind::Failure => self.apply_failure(outcome).await,
        }
    }

    async fn apply_success(&self, outcome: PaymentOutcome) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .find_by_id_for_update(&mut tx, outcome.event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound {
                event_id: outcome.event_id,
            })?;

        let existed = self
            .participants
            .exists_in_tx(&mut tx, outcome.event_id, outcome.user_id)
            .await?;

        let booking_ref = generate_booking_ref(BOOKING_REF_LENGTH);
        let participant = self
            .participants
            .upsert_payment_completed_in_tx(
                &mut tx,
                outcome.event_id,
                outcome.user_id,
                outcome.amount_cents,
                &outcome.payment_ref,
                &booking_ref,
            )
            .await?;

        let count = self
            .participants
            .count_in_tx(&mut tx, outcome.event_id)
            .await?;

        let event = if count >= i64::from(event.max_participants)
            && event.status == EventStatus::Open
        {
            self.events
                .set_status_in_tx(&mut tx, outcome.event_id, EventStatus::Full)
                .await?
        } else {
            event
        };

        tx.commit().await?;

        log_payment_outcome(
            outcome.event_id,
            outcome.user_id,
            "success",
            &outcome.payment_ref,
        );

        // A record created here is a seat reserved by the payment itself;
        // confirm it like a normal join
        if !existed {
            self.spawn_booking_confirmation(participant, event);
        }

        Ok(())
    }

    async fn apply_failure(&self, outcome: PaymentOutcome) -> Result<()> {
        let updated = self
            .participants
            .mark_payment_failed(outcome.event_id, outcome.user_id, &outcome.payment_ref)
            .await?;

        if updated {
            log_payment_outcome(
                outcome.event_id,
                outcome.user_id,
                "failure",
                &outcome.payment_ref,
            );
        } else {
            info!(
                event_id = outcome.event_id,
                user_id = outcome.user_id,
                payment_ref = %outcome.payment_ref,
                "Payment failure for unknown participant, nothing to update"
            );
        }

        Ok(())
    }

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
