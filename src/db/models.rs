use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription plan. Only `free` is subject to the request cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_plan", rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Ultimate,
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Free
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub plan: Plan,
    pub free_requests_used: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, plan: Plan) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            // Emails are compared case-insensitively; store the canonical form.
            email: email.to_lowercase(),
            password_hash,
            plan,
            free_requests_used: 0,
            created_at: Utc::now(),
        }
    }
}

/// Wire projection of a user. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub plan: Plan,
    pub free_requests_used: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            plan: user.plan,
            free_requests_used: user.free_requests_used,
            created_at: user.created_at,
        }
    }
}
