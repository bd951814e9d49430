//! Payment reconciliation integration tests
//!
//! The payment collaborator delivers outcomes at-least-once; these tests pin
//! the upsert idempotency and the failure semantics.

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serial_test::serial;

use gatherly::models::event::EventStatus;
use gatherly::models::participant::{PaymentOutcome, PaymentOutcomeKind, PaymentStatus};
use gatherly::models::user::UserRole;
use gatherly::GatherlyError;
use helpers::*;

fn success(user_id: i64, event_id: i64, amount_cents: i64, payment_ref: &str) -> PaymentOutcome {
    PaymentOutcome {
        outcome: PaymentOutcomeKind::Success,
        user_id,
        event_id,
        amount_cents,
        payment_ref: payment_ref.to_string(),
    }
}

fn failure(user_id: i64, event_id: i64, payment_ref: &str) -> PaymentOutcome {
    PaymentOutcome {
        outcome: PaymentOutcomeKind::Failure,
        user_id,
        event_id,
        amount_cents: 0,
        payment_ref: payment_ref.to_string(),
    }
}

#[tokio::test]
#[serial]
async fn test_success_creates_participant_when_absent() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 10, 2500),
    )
    .await;

    // Payment preceded seat reservation; the callback creates the record
    services
        .payments
        .reconcile_payment_outcome(success(guest.id, event.id, 2500, "pay_abc123"))
        .await
        .unwrap();

    let membership = services
        .participation
        .check_participation(guest.id, event.id)
        .await
        .unwrap();
    assert!(membership.is_participant);
    assert_eq!(participant_count(&db.pool, event.id).await, 1);

    let (status, amount, payment_ref): (PaymentStatus, Option<i64>, Option<String>) =
        sqlx::query_as("SELECT payment_status, amount_paid_cents, payment_ref FROM event_participants WHERE event_id = $1 AND user_id = $2")
            .bind(event.id)
            .bind(guest.id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(status, PaymentStatus::Completed);
    assert_eq!(amount, Some(2500));
    assert_eq!(payment_ref.as_deref(), Some("pay_abc123"));
}

#[tokio::test]
#[serial]
async fn test_success_is_idempotent() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 10, 2500),
    )
    .await;

    let outcome = success(guest.id, event.id, 2500, "pay_abc123");
    services
        .payments
        .reconcile_payment_outcome(outcome.clone())
        .await
        .unwrap();
    services
        .payments
        .reconcile_payment_outcome(outcome)
        .await
        .unwrap();

    // Redelivery lands on the same record; one seat, not two
    assert_eq!(participant_count(&db.pool, event.id).await, 1);
}

#[tokio::test]
#[serial]
async fn test_success_completes_pending_join() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 10, 2500),
    )
    .await;

    let joined = services
        .participation
        .join_event(guest.id, event.id)
        .await
        .unwrap();
    assert_eq!(joined.participant.payment_status, PaymentStatus::Pending);

    services
        .payments
        .reconcile_payment_outcome(success(guest.id, event.id, 2500, "pay_abc123"))
        .await
        .unwrap();

    let (status, booking_ref): (PaymentStatus, String) = sqlx::query_as(
        "SELECT payment_status, booking_ref FROM event_participants WHERE event_id = $1 AND user_id = $2",
    )
    .bind(event.id)
    .bind(guest.id)
    .fetch_one(&db.pool)
    .await
    .unwrap();

    assert_eq!(status, PaymentStatus::Completed);
    // The original booking reference survives the upsert
    assert_eq!(booking_ref, joined.participant.booking_ref);
    assert_eq!(participant_count(&db.pool, event.id).await, 1);
}

#[tokio::test]
#[serial]
async fn test_success_flips_status_when_capacity_reached() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 1, 2500),
    )
    .await;

    services
        .payments
        .reconcile_payment_outcome(success(guest.id, event.id, 2500, "pay_abc123"))
        .await
        .unwrap();

    assert_eq!(stored_status(&db.pool, event.id).await, EventStatus::Full);
}

#[tokio::test]
#[serial]
async fn test_failure_marks_record_without_freeing_seat() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 10, 2500),
    )
    .await;

    services
        .participation
        .join_event(guest.id, event.id)
        .await
        .unwrap();

    services
        .payments
        .reconcile_payment_outcome(failure(guest.id, event.id, "pay_abc123"))
        .await
        .unwrap();

    // The record stays and keeps occupying its seat
    assert_eq!(participant_count(&db.pool, event.id).await, 1);
    let (status,): (PaymentStatus,) = sqlx::query_as(
        "SELECT payment_status FROM event_participants WHERE event_id = $1 AND user_id = $2",
    )
    .bind(event.id)
    .bind(guest.id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(status, PaymentStatus::Failed);
}

#[tokio::test]
#[serial]
async fn test_failure_without_record_is_a_noop() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::priced(host.id, Utc::now() + Duration::days(7), 10, 2500),
    )
    .await;

    services
        .payments
        .reconcile_payment_outcome(failure(guest.id, event.id, "pay_unknown"))
        .await
        .unwrap();

    assert_eq!(participant_count(&db.pool, event.id).await, 0);
}

#[tokio::test]
#[serial]
async fn test_success_for_missing_event_is_not_found() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;

    let err = services
        .payments
        .reconcile_payment_outcome(success(guest.id, 424242, 2500, "pay_abc123"))
        .await
        .unwrap_err();

    assert_matches!(err, GatherlyError::EventNotFound { event_id: 424242 });
}
