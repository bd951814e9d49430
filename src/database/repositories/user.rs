//! User repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::models::user::{CreateUserRequest, User, UserRole};
use crate::utils::errors::GatherlyError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, GatherlyError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, display_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, display_name, role, created_at, updated_at
            "#,
        )
        .bind(request.email)
        .bind(request.display_name)
        .bind(request.role.unwrap_or(UserRole::User))
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, GatherlyError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, role, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find users by a batch of IDs
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, GatherlyError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, role, created_at, updated_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
