use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::User;
use crate::error::AppError;

/// Outcome of the conditional free-request increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOutcome {
    /// The counter was incremented; carries the new value.
    Consumed(i32),
    /// The counter had already reached the limit; nothing was written.
    Exhausted,
}

/// Persistence contract for user records.
///
/// `consume_free_request` is the one operation that must be atomic: the
/// check against the limit and the increment happen as a single
/// conditional update, never as a read followed by a write.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn consume_free_request(&self, id: Uuid, limit: i32) -> Result<QuotaOutcome, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
}

pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        Ok(Self::new(Arc::new(pool)))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: User) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, plan, free_requests_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, password_hash, plan, free_requests_used, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.plan)
        .bind(user.free_requests_used)
        .bind(user.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, plan, free_requests_used, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, plan, free_requests_used, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn consume_free_request(&self, id: Uuid, limit: i32) -> Result<QuotaOutcome, AppError> {
        // Single conditional update; concurrent callers serialize on the row
        // so at most `limit` increments ever succeed.
        let updated: Option<(i32,)> = sqlx::query_as(
            "UPDATE users SET free_requests_used = free_requests_used + 1 \
             WHERE id = $1 AND free_requests_used < $2 \
             RETURNING free_requests_used",
        )
        .bind(id)
        .bind(limit)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(match updated {
            Some((used,)) => QuotaOutcome::Consumed(used),
            None => QuotaOutcome::Exhausted,
        })
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, plan, free_requests_used, created_at \
             FROM users ORDER BY created_at",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(users)
    }
}
