use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::User;
use crate::db::store::{QuotaOutcome, UserStore};
use crate::error::AppError;

/// In-memory `UserStore` backing tests and local runs.
///
/// The quota increment runs entirely inside the write-lock critical
/// section, which gives it the same atomicity as the SQL conditional
/// update in `PgUserStore`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn consume_free_request(&self, id: Uuid, limit: i32) -> Result<QuotaOutcome, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::Database("user not found".into()))?;

        if user.free_requests_used >= limit {
            return Ok(QuotaOutcome::Exhausted);
        }
        user.free_requests_used += 1;
        Ok(QuotaOutcome::Consumed(user.free_requests_used))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }
}
