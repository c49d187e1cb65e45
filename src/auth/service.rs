use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::db::models::{Plan, User};
use crate::db::store::UserStore;
use crate::error::AppError;

/// Caller identity for the generation endpoint.
///
/// Token verification failures collapse to `Anonymous` instead of erroring:
/// a bad or expired token forfeits plan-aware treatment but never blocks
/// the call.
pub enum Identity {
    Known(User),
    Anonymous,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self { store, hasher, tokens }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        plan: Plan,
    ) -> Result<User, AppError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("all fields required".into()));
        }
        if password.chars().count() < 6 {
            return Err(AppError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password.to_string()).await?;
        let user = User::new(name.to_string(), email.to_string(), password_hash, plan);

        // The store enforces uniqueness as well; the lookup above just gives
        // the common case a clean error without relying on a constraint.
        self.store.create(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("email and password required".into()));
        }

        // Unknown email and wrong password must be indistinguishable.
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let ok = self
            .hasher
            .verify(password.to_string(), user.password_hash.clone())
            .await?;
        if !ok {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, user.plan)?;
        Ok((token, user))
    }

    /// Resolves a bearer token to a stored user, or `Anonymous` when the
    /// token is absent, invalid, expired, or points at no known user.
    pub async fn resolve_identity(&self, bearer: Option<&str>) -> Identity {
        let token = match bearer {
            Some(token) => token,
            None => return Identity::Anonymous,
        };

        let claims = match self.tokens.verify(token) {
            Some(claims) => claims,
            None => {
                debug!("discarding unverifiable bearer token");
                return Identity::Anonymous;
            }
        };

        let id = match Uuid::parse_str(&claims.sub) {
            Ok(id) => id,
            Err(_) => return Identity::Anonymous,
        };

        match self.store.find_by_id(id).await {
            Ok(Some(user)) => Identity::Known(user),
            _ => Identity::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryUserStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            PasswordHasher::with_params(8, 1, 1),
            TokenService::new("test_secret".into(), 7),
        )
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields_and_short_passwords() {
        let svc = service();

        let err = svc.register("", "a@b.c", "password123", Plan::Free).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = svc.register("Test", "a@b.c", "12345", Plan::Free).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_never_stores_plaintext() {
        let svc = service();
        let user = svc
            .register("Test", "a@b.c", "password123", Plan::Free)
            .await
            .unwrap();
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_duplicate_email_regardless_of_other_fields() {
        let svc = service();
        svc.register("One", "dup@example.com", "password1", Plan::Free)
            .await
            .unwrap();

        let err = svc
            .register("Two", "DUP@EXAMPLE.COM", "different9", Plan::Pro)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_login_roundtrip_resolves_same_subject() {
        let svc = service();
        let user = svc
            .register("Test", "a@b.c", "password123", Plan::Pro)
            .await
            .unwrap();

        let (token, logged_in) = svc.login("a@b.c", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        match svc.resolve_identity(Some(&token)).await {
            Identity::Known(resolved) => {
                assert_eq!(resolved.id, user.id);
                assert_eq!(resolved.plan, Plan::Pro);
            }
            Identity::Anonymous => panic!("expected a resolved identity"),
        }
    }

    #[tokio::test]
    async fn test_login_failures_share_one_error() {
        let svc = service();
        svc.register("Test", "a@b.c", "password123", Plan::Free)
            .await
            .unwrap();

        let unknown = svc.login("nobody@b.c", "password123").await.unwrap_err();
        let wrong = svc.login("a@b.c", "wrongpassword").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_bad_tokens_resolve_to_anonymous() {
        let svc = service();
        assert!(matches!(svc.resolve_identity(None).await, Identity::Anonymous));
        assert!(matches!(
            svc.resolve_identity(Some("garbage")).await,
            Identity::Anonymous
        ));

        // Valid signature but no such user.
        let tokens = TokenService::new("test_secret".into(), 7);
        let token = tokens.issue(Uuid::new_v4(), Plan::Free).unwrap();
        assert!(matches!(
            svc.resolve_identity(Some(&token)).await,
            Identity::Anonymous
        ));
    }
}
