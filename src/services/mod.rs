//! Services module
//!
//! This module contains business logic services

pub mod event;
pub mod lifecycle;
pub mod mailer;
pub mod notification;
pub mod participation;
pub mod payments;
pub mod review;
pub mod status;

// Re-export commonly used services
pub use event::EventService;
pub use lifecycle::{LifecycleService, LifecycleWorker};
pub use mailer::{MailerClient, MailReceipt};
pub use notification::{MessageTemplate, NotificationRequest, NotificationService, NotificationStats};
pub use participation::ParticipationService;
pub use payments::PaymentService;
pub use review::ReviewService;
pub use status::resolve_status;

use chrono::Duration;
use sqlx::PgPool;

use crate::config::Settings;
use crate::database::repositories::{
    EventRepository, ParticipantRepository, ReviewRepository, UserRepository,
};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub events: EventService,
    pub participation: ParticipationService,
    pub payments: PaymentService,
    pub reviews: ReviewService,
    pub lifecycle: LifecycleService,
    pub notifications: NotificationService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(pool: PgPool, settings: Settings) -> Result<Self> {
        let event_repository = EventRepository::new(pool.clone());
        let participant_repository = ParticipantRepository::new(pool.clone());
        let review_repository = ReviewRepository::new(pool.clone());
        let user_repository = UserRepository::new(pool.clone());

        let mailer = MailerClient::new(settings.mailer.clone())?;
        let notifications = NotificationService::new(mailer);

        let events = EventService::new(
            event_repository.clone(),
            participant_repository.clone(),
            user_repository.clone(),
            notifications.clone(),
        );
        let participation = ParticipationService::new(
            pool.clone(),
            event_repository.clone(),
            participant_repository.clone(),
            user_repository.clone(),
            notifications.clone(),
        );
        let payments = PaymentService::new(
            pool,
            event_repository.clone(),
            participant_repository.clone(),
            user_repository.clone(),
            notifications.clone(),
        );
        let reviews = ReviewService::new(
            review_repository,
            event_repository.clone(),
            participant_repository.clone(),
        );
        let lifecycle = LifecycleService::new(
            event_repository,
            participant_repository,
            user_repository,
            notifications.clone(),
            Duration::hours(settings.scheduler.reminder_lookahead_hours),
        );

        Ok(Self {
            events,
            participation,
            payments,
            reviews,
            lifecycle,
            notifications,
        })
    }
}
