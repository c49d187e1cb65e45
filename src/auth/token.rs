use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Plan;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    /// Plan at issuance time. Informational; quota decisions always read
    /// the stored record, so a stale snapshot is harmless.
    pub plan: Plan,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies the signed bearer tokens handed out at login.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiry_days: i64,
}

impl TokenService {
    pub fn new(secret: String, expiry_days: i64) -> Self {
        Self { secret, expiry_days }
    }

    pub fn issue(&self, subject: Uuid, plan: Plan) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            plan,
            exp: (now + Duration::days(self.expiry_days)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Signature and expiry check. Returns `None` for anything malformed,
    /// expired, or mis-signed; callers decide whether that means
    /// "anonymous" or "rejected".
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test_secret".into(), 7)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.issue(id, Plan::Pro).unwrap();

        let claims = svc.verify(&token).expect("token should verify");
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.plan, Plan::Pro);
        assert!(claims.exp > claims.iat);
        // 7-day window, allowing a little slack for test runtime.
        let window = claims.exp - claims.iat;
        assert!((window - 7 * 24 * 3600).abs() <= 5);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = service().issue(Uuid::new_v4(), Plan::Free).unwrap();
        let other = TokenService::new("other_secret".into(), 7);
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(service().verify("not.a.token").is_none());
        assert!(service().verify("").is_none());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let svc = TokenService::new("test_secret".into(), -1);
        let token = svc.issue(Uuid::new_v4(), Plan::Free).unwrap();
        assert!(svc.verify(&token).is_none());
    }
}
