//! Lifecycle sweeper and reminder integration tests

mod helpers;

use chrono::{Duration, Utc};
use serial_test::serial;

use gatherly::models::event::EventStatus;
use gatherly::models::user::UserRole;
use helpers::*;

#[tokio::test]
#[serial]
async fn test_sweep_converges_expired_open_event() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::days(1), 10),
    )
    .await;

    let swept = services
        .lifecycle
        .sweep_expired_events(Utc::now())
        .await
        .unwrap();

    assert_eq!(swept, 1);
    assert_eq!(stored_status(&db.pool, event.id).await, EventStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_sweep_handles_expired_full_event() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::hours(3), 5)
            .with_status(EventStatus::Full),
    )
    .await;

    let swept = services
        .lifecycle
        .sweep_expired_events(Utc::now())
        .await
        .unwrap();

    assert_eq!(swept, 1);
    assert_eq!(stored_status(&db.pool, event.id).await, EventStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_sweep_leaves_terminal_and_future_events_alone() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let cancelled = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::days(2), 10)
            .with_status(EventStatus::Cancelled),
    )
    .await;
    let future = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() + Duration::days(2), 10),
    )
    .await;

    let swept = services
        .lifecycle
        .sweep_expired_events(Utc::now())
        .await
        .unwrap();

    assert_eq!(swept, 0);
    assert_eq!(
        stored_status(&db.pool, cancelled.id).await,
        EventStatus::Cancelled
    );
    assert_eq!(stored_status(&db.pool, future.id).await, EventStatus::Open);
}

#[tokio::test]
#[serial]
async fn test_sweep_is_idempotent() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::days(1), 10),
    )
    .await;

    let first = services
        .lifecycle
        .sweep_expired_events(Utc::now())
        .await
        .unwrap();
    let second = services
        .lifecycle
        .sweep_expired_events(Utc::now())
        .await
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
}

#[tokio::test]
#[serial]
async fn test_effective_status_presented_before_sweep() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::hours(1), 10),
    )
    .await;

    // Stored status lags until the sweeper runs, but reads already resolve
    let view = services.events.get_event(event.id).await.unwrap();
    assert_eq!(view.event.status, EventStatus::Open);
    assert_eq!(view.effective_status, EventStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_reminders_sent_to_each_participant() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let mail = MailMockServer::new().await;
    let services = test_services_with_mailer(db.pool.clone(), mail.send_url());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let a = create_test_user(&db.pool, "a@example.com", UserRole::User).await;
    let b = create_test_user(&db.pool, "b@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() + Duration::hours(12), 10),
    )
    .await;

    services.participation.join_event(a.id, event.id).await.unwrap();
    services.participation.join_event(b.id, event.id).await.unwrap();

    // Let the fire-and-forget booking confirmations drain before baselining
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    let joins_delivered = mail.deliveries().await;

    let sent = services
        .lifecycle
        .dispatch_reminders(Utc::now())
        .await
        .unwrap();

    assert_eq!(sent, 2);
    assert_eq!(mail.deliveries().await, joins_delivered + 2);
}

#[tokio::test]
#[serial]
async fn test_reminders_skip_events_outside_window() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let mail = MailMockServer::new().await;
    let services = test_services_with_mailer(db.pool.clone(), mail.send_url());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;

    // Too far out for the 24h lookahead
    let far = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() + Duration::days(10), 10),
    )
    .await;
    services.participation.join_event(guest.id, far.id).await.unwrap();

    let sent = services
        .lifecycle
        .dispatch_reminders(Utc::now())
        .await
        .unwrap();

    assert_eq!(sent, 0);
}

#[tokio::test]
#[serial]
async fn test_reminders_only_consider_stored_open_events() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let mail = MailMockServer::new().await;
    let services = test_services_with_mailer(db.pool.clone(), mail.send_url());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;

    // Pins current behavior: the window scan filters on stored status OPEN,
    // so a full event inside the window sends nothing
    let full = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() + Duration::hours(6), 1),
    )
    .await;
    services.participation.join_event(guest.id, full.id).await.unwrap();
    assert_eq!(stored_status(&db.pool, full.id).await, gatherly::models::event::EventStatus::Full);

    let sent = services
        .lifecycle
        .dispatch_reminders(Utc::now())
        .await
        .unwrap();

    assert_eq!(sent, 0);
}

#[tokio::test]
#[serial]
async fn test_terminal_status_is_monotonic() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let services = test_services(db.pool.clone());

    let host = create_test_user(&db.pool, "host@example.com", UserRole::User).await;
    let guest = create_test_user(&db.pool, "guest@example.com", UserRole::User).await;
    let event = create_test_event(
        &db.pool,
        EventSpec::free(host.id, Utc::now() - Duration::days(1), 10)
            .with_status(EventStatus::Cancelled),
    )
    .await;

    // Neither the sweeper nor a join/leave attempt moves a terminal status
    services.lifecycle.sweep_expired_events(Utc::now()).await.unwrap();
    let _ = services.participation.join_event(guest.id, event.id).await;
    let _ = services.participation.leave_event(guest.id, event.id).await;

    assert_eq!(
        stored_status(&db.pool, event.id).await,
        EventStatus::Cancelled
    );
}
