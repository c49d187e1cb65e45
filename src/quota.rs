use std::sync::Arc;

use tracing::info;

use crate::auth::service::Identity;
use crate::db::models::Plan;
use crate::db::store::{QuotaOutcome, UserStore};
use crate::error::AppError;

/// Hard cap on lifetime generation calls for free-tier accounts.
pub const FREE_REQUEST_LIMIT: i32 = 3;

/// Admission policy for the generation endpoint.
///
/// Stateless per request: anonymous callers and paid plans pass untouched;
/// free-tier callers consume one unit through the store's atomic
/// conditional increment, so concurrent calls can never push the counter
/// past the limit.
pub struct QuotaGate {
    store: Arc<dyn UserStore>,
    limit: i32,
}

impl QuotaGate {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, limit: FREE_REQUEST_LIMIT }
    }

    pub async fn admit(&self, identity: &Identity) -> Result<(), AppError> {
        let user = match identity {
            // Unauthenticated calls bypass the quota entirely; deliberate policy.
            Identity::Anonymous => return Ok(()),
            Identity::Known(user) => user,
        };

        if user.plan != Plan::Free {
            return Ok(());
        }

        match self.store.consume_free_request(user.id, self.limit).await? {
            QuotaOutcome::Consumed(used) => {
                info!(user_id = %user.id, used, "free request consumed");
                Ok(())
            }
            QuotaOutcome::Exhausted => {
                info!(user_id = %user.id, "free request limit reached");
                Err(AppError::QuotaExceeded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryUserStore;
    use crate::db::models::User;

    async fn setup(plan: Plan) -> (Arc<MemoryUserStore>, QuotaGate, User) {
        let store = Arc::new(MemoryUserStore::new());
        let user = store
            .create(User::new("Test".into(), "q@example.com".into(), "hash".into(), plan))
            .await
            .unwrap();
        let gate = QuotaGate::new(store.clone());
        (store, gate, user)
    }

    #[tokio::test]
    async fn test_anonymous_always_passes() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = QuotaGate::new(store);
        assert!(gate.admit(&Identity::Anonymous).await.is_ok());
    }

    #[tokio::test]
    async fn test_free_tier_allows_three_then_rejects() {
        let (store, gate, user) = setup(Plan::Free).await;
        let identity = Identity::Known(user.clone());

        for expected in 1..=3 {
            gate.admit(&identity).await.unwrap();
            let stored = store.find_by_id(user.id).await.unwrap().unwrap();
            assert_eq!(stored.free_requests_used, expected);
        }

        let err = gate.admit(&identity).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded));

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.free_requests_used, 3);
    }

    #[tokio::test]
    async fn test_paid_plans_never_touch_the_counter() {
        for plan in [Plan::Pro, Plan::Ultimate] {
            let store = Arc::new(MemoryUserStore::new());
            let user = store
                .create(User::new("Test".into(), "p@example.com".into(), "hash".into(), plan))
                .await
                .unwrap();
            let gate = QuotaGate::new(store.clone());
            let identity = Identity::Known(user.clone());

            for _ in 0..10 {
                gate.admit(&identity).await.unwrap();
            }
            let stored = store.find_by_id(user.id).await.unwrap().unwrap();
            assert_eq!(stored.free_requests_used, 0);
        }
    }

    #[tokio::test]
    async fn test_exactly_three_of_n_concurrent_calls_succeed() {
        let (store, gate, user) = setup(Plan::Free).await;
        let gate = Arc::new(gate);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let gate = gate.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                gate.admit(&Identity::Known(user)).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.free_requests_used, 3);
    }
}
