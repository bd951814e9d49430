//! Participant repository implementation
//!
//! Join records are mutated inside event-level transactions; the methods that
//! take a `Transaction` expect the caller to already hold the event row lock
//! (see `EventRepository::find_by_id_for_update`).

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::participant::{Participant, PaymentStatus};
use crate::utils::errors::GatherlyError;

const PARTICIPANT_COLUMNS: &str =
    "id, event_id, user_id, joined_at, attended, payment_status, amount_paid_cents, payment_ref, booking_ref";

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a join record for a user/event pair
    pub async fn find_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, GatherlyError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM event_participants WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Check for an existing join record inside a transaction
    pub async fn exists_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<bool, GatherlyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count.0 > 0)
    }

    /// Live seat count for an event inside a transaction
    pub async fn count_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
    ) -> Result<i64, GatherlyError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_participants WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(count.0)
    }

    /// Live seat count for an event
    pub async fn count_for_event(&self, event_id: i64) -> Result<i64, GatherlyError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_participants WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Seat counts for a batch of events, for listing reads
    pub async fn count_for_events(&self, event_ids: &[i64]) -> Result<Vec<(i64, i64)>, GatherlyError> {
        let counts: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT event_id, COUNT(*) FROM event_participants WHERE event_id = ANY($1) GROUP BY event_id",
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Insert a join record inside a transaction
    pub async fn insert_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
        payment_status: PaymentStatus,
        booking_ref: &str,
    ) -> Result<Participant, GatherlyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO event_participants (event_id, user_id, joined_at, payment_status, booking_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_id, user_id, joined_at, attended, payment_status, amount_paid_cents, payment_ref, booking_ref
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(payment_status)
        .bind(booking_ref)
        .fetch_one(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Delete a join record inside a transaction; returns whether a record
    /// existed
    pub async fn delete_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<bool, GatherlyError> {
        let result =
            sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Upsert a join record for a completed payment.
    ///
    /// Keyed on the unique (event, user) pair so at-least-once delivery of the
    /// same outcome lands on one record and capacity counts one seat. An
    /// existing record keeps its joined_at and booking_ref.
    pub async fn upsert_payment_completed_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
        amount_cents: i64,
        payment_ref: &str,
        booking_ref: &str,
    ) -> Result<Participant, GatherlyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO event_participants (event_id, user_id, joined_at, payment_status, amount_paid_cents, payment_ref, booking_ref)
            VALUES ($1, $2, $3, 'completed', $4, $5, $6)
            ON CONFLICT (event_id, user_id) DO UPDATE
            SET payment_status = 'completed',
                amount_paid_cents = EXCLUDED.amount_paid_cents,
                payment_ref = EXCLUDED.payment_ref
            RETURNING id, event_id, user_id, joined_at, attended, payment_status, amount_paid_cents, payment_ref, booking_ref
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(amount_cents)
        .bind(payment_ref)
        .bind(booking_ref)
        .fetch_one(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Mark the payment of an existing join record as failed.
    ///
    /// Matches on the payment reference as well; a failure for an unknown
    /// reference touches nothing. Returns whether a record was updated.
    pub async fn mark_payment_failed(
        &self,
        event_id: i64,
        user_id: i64,
        payment_ref: &str,
    ) -> Result<bool, GatherlyError> {
        let result = sqlx::query(
            "UPDATE event_participants SET payment_status = 'failed', payment_ref = $3 WHERE event_id = $1 AND user_id = $2 AND (payment_ref IS NULL OR payment_ref = $3)",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(payment_ref)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all participants of an event, earliest join first
    pub async fn get_event_participants(
        &self,
        event_id: i64,
    ) -> Result<Vec<Participant>, GatherlyError> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM event_participants WHERE event_id = $1 ORDER BY joined_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Mark attendance on a join record
    pub async fn set_attended(
        &self,
        event_id: i64,
        user_id: i64,
        attended: bool,
    ) -> Result<Participant, GatherlyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE event_participants
            SET attended = $3
            WHERE event_id = $1 AND user_id = $2
            RETURNING id, event_id, user_id, joined_at, attended, payment_status, amount_paid_cents, payment_ref, booking_ref
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(attended)
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }
}
