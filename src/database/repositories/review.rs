//! Review repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::models::review::{CreateReviewRequest, Review};
use crate::utils::errors::GatherlyError;

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new review
    pub async fn create(&self, request: CreateReviewRequest) -> Result<Review, GatherlyError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (event_id, reviewer_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_id, reviewer_id, rating, comment, created_at
            "#,
        )
        .bind(request.event_id)
        .bind(request.reviewer_id)
        .bind(request.rating)
        .bind(request.comment)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    /// Check if a reviewer already reviewed an event
    pub async fn exists(&self, event_id: i64, reviewer_id: i64) -> Result<bool, GatherlyError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE event_id = $1 AND reviewer_id = $2")
                .bind(event_id)
                .bind(reviewer_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0 > 0)
    }

    /// Get reviews for an event, newest first
    pub async fn get_event_reviews(&self, event_id: i64) -> Result<Vec<Review>, GatherlyError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, event_id, reviewer_id, rating, comment, created_at FROM reviews WHERE event_id = $1 ORDER BY created_at DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Average rating for an event, None when unreviewed
    pub async fn average_rating(&self, event_id: i64) -> Result<Option<f64>, GatherlyError> {
        let avg: (Option<f64>,) =
            sqlx::query_as("SELECT AVG(rating)::DOUBLE PRECISION FROM reviews WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(avg.0)
    }
}
