//! Event repository implementation

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::event::{CreateEventRequest, Event, EventFilter, EventStatus, UpdateEventRequest};
use crate::utils::errors::GatherlyError;

const EVENT_COLUMNS: &str = "id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, host_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at
            "#,
        )
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.location)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.event_date)
        .bind(request.max_participants)
        .bind(request.price_cents)
        .bind(request.host_id)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID inside a transaction, taking an exclusive row lock.
    ///
    /// Every flow that reads the participant count and then writes (join,
    /// leave, payment reconciliation) must go through this lock so that
    /// concurrent mutations of the same event's capacity are serialized.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Event>, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(event)
    }

    /// Update event attributes
    pub async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                location = COALESCE($5, location),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                event_date = COALESCE($8, event_date),
                max_participants = COALESCE($9, max_participants),
                price_cents = COALESCE($10, price_cents),
                updated_at = $11
            WHERE id = $1
            RETURNING id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.location)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.event_date)
        .bind(request.max_participants)
        .bind(request.price_cents)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Delete event; participations and reviews cascade
    pub async fn delete(&self, id: i64) -> Result<(), GatherlyError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Set the stored status of an event
    pub async fn set_status(&self, id: i64, status: EventStatus) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $2, updated_at = $3 WHERE id = $1 RETURNING id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Set the stored status inside an already-locked transaction
    pub async fn set_status_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        status: EventStatus,
    ) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $2, updated_at = $3 WHERE id = $1 RETURNING id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(event)
    }

    /// List events with filters and pagination, soonest first
    pub async fn list(
        &self,
        filter: &EventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR location = $2)
              AND ($3 OR event_date >= NOW())
            ORDER BY event_date ASC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(filter.location.as_deref())
        .bind(filter.include_past)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get events created by a host, soonest first
    pub async fn get_host_events(&self, host_id: i64) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE host_id = $1 ORDER BY event_date ASC"
        ))
        .bind(host_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get events a user has joined, optionally restricted to upcoming or past
    pub async fn get_user_joined_events(
        &self,
        user_id: i64,
        upcoming: Option<bool>,
    ) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.title, e.description, e.category, e.location, e.latitude, e.longitude, e.event_date, e.max_participants, e.price_cents, e.status, e.host_id, e.created_at, e.updated_at
            FROM events e
            INNER JOIN event_participants ep ON e.id = ep.event_id
            WHERE ep.user_id = $1
              AND ($2::BOOLEAN IS NULL OR (e.event_date >= NOW()) = $2)
            ORDER BY e.event_date ASC
            "#,
        )
        .bind(user_id)
        .bind(upcoming)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Bulk-transition expired live events to completed.
    ///
    /// Terminal states are left untouched; returns the number of rows swept.
    pub async fn complete_expired(&self, now: DateTime<Utc>) -> Result<u64, GatherlyError> {
        let result = sqlx::query(
            "UPDATE events SET status = 'completed', updated_at = $2 WHERE event_date < $1 AND status IN ('open', 'full')",
        )
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Get stored-open events starting inside the lookahead window
    pub async fn get_upcoming_open_events(
        &self,
        now: DateTime<Utc>,
        lookahead: Duration,
    ) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = 'open' AND event_date > $1 AND event_date <= $2 ORDER BY event_date ASC"
        ))
        .bind(now)
        .bind(now + lookahead)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
