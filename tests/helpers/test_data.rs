//! Test data builders
//!
//! Rows are inserted directly so tests can set up states the public API
//! refuses to create (past dates, pre-set statuses).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gatherly::models::event::{Event, EventStatus};
use gatherly::models::user::{User, UserRole};

pub async fn create_test_user(pool: &PgPool, email: &str, role: UserRole) -> User {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, display_name, role)
        VALUES ($1, $2, $3)
        RETURNING id, email, display_name, role, created_at, updated_at
        "#,
    )
    .bind(email)
    .bind(email.split('@').next().unwrap_or("user"))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test user")
}

pub struct EventSpec {
    pub host_id: i64,
    pub event_date: DateTime<Utc>,
    pub max_participants: i32,
    pub price_cents: i64,
    pub status: EventStatus,
}

impl EventSpec {
    pub fn free(host_id: i64, event_date: DateTime<Utc>, max_participants: i32) -> Self {
        Self {
            host_id,
            event_date,
            max_participants,
            price_cents: 0,
            status: EventStatus::Open,
        }
    }

    pub fn priced(
        host_id: i64,
        event_date: DateTime<Utc>,
        max_participants: i32,
        price_cents: i64,
    ) -> Self {
        Self {
            price_cents,
            ..Self::free(host_id, event_date, max_participants)
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }
}

pub async fn create_test_event(pool: &PgPool, spec: EventSpec) -> Event {
    sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (title, description, category, location, event_date, max_participants, price_cents, status, host_id)
        VALUES ('Test event', 'An event for testing', 'testing', 'Test hall', $1, $2, $3, $4, $5)
        RETURNING id, title, description, category, location, latitude, longitude, event_date, max_participants, price_cents, status, host_id, created_at, updated_at
        "#,
    )
    .bind(spec.event_date)
    .bind(spec.max_participants)
    .bind(spec.price_cents)
    .bind(spec.status)
    .bind(spec.host_id)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test event")
}

pub async fn participant_count(pool: &PgPool, event_id: i64) -> i64 {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM event_participants WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
            .expect("Failed to count participants");
    count.0
}

pub async fn stored_status(pool: &PgPool, event_id: i64) -> EventStatus {
    let status: (EventStatus,) = sqlx::query_as("SELECT status FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read event status");
    status.0
}
