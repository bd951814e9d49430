//! Review service implementation
//!
//! Reviews hang off the lifecycle: only participants of events whose stored
//! status is completed may write one. The sweeper is what makes that filter
//! reliable without recomputing status here.

use tracing::info;

use crate::database::repositories::{EventRepository, ParticipantRepository, ReviewRepository};
use crate::models::event::EventStatus;
use crate::models::review::{CreateReviewRequest, Review};
use crate::utils::errors::{GatherlyError, Result};

/// Review service for post-event feedback
#[derive(Clone)]
pub struct ReviewService {
    reviews: ReviewRepository,
    events: EventRepository,
    participants: ParticipantRepository,
}

impl ReviewService {
    /// Create a new ReviewService instance
    pub fn new(
        reviews: ReviewRepository,
        events: EventRepository,
        participants: ParticipantRepository,
    ) -> Self {
        Self {
            reviews,
            events,
            participants,
        }
    }

    /// Create a review for a completed event the reviewer attended
    pub async fn create_review(&self, request: CreateReviewRequest) -> Result<Review> {
        if !(1..=5).contains(&request.rating) {
            return Err(GatherlyError::Rejected(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let event_id = request.event_id;
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.status != EventStatus::Completed {
            return Err(GatherlyError::Rejected(
                "You can only review completed events".to_string(),
            ));
        }

        let participant = self
            .participants
            .find_by_event_and_user(event_id, request.reviewer_id)
            .await?;

        if participant.is_none() {
            return Err(GatherlyError::Rejected(
                "Only participants can review this event".to_string(),
            ));
        }

        if self.reviews.exists(event_id, request.reviewer_id).await? {
            return Err(GatherlyError::Rejected(
                "You have already reviewed this event".to_string(),
            ));
        }

        let reviewer_id = request.reviewer_id;
        let review = self.reviews.create(request).await?;
        info!(
            event_id = event_id,
            reviewer_id = reviewer_id,
            rating = review.rating,
            "Review created"
        );

        Ok(review)
    }

    /// Get reviews for an event
    pub async fn get_event_reviews(&self, event_id: i64) -> Result<Vec<Review>> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.reviews.get_event_reviews(event_id).await
    }

    /// Average rating for an event, None when unreviewed
    pub async fn average_rating(&self, event_id: i64) -> Result<Option<f64>> {
        self.reviews.average_rating(event_id).await
    }
}
