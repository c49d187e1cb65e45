use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AppError;

/// Argon2id password hashing with a fixed cost.
///
/// Hashing is deliberately slow; both operations run on the blocking
/// thread pool so they never starve the async runtime.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    const MEMORY_COST: u32 = 19_456;
    const TIME_COST: u32 = 2;
    const PARALLELISM: u32 = 1;
    const OUTPUT_LEN: usize = 32;

    pub fn new() -> Self {
        let params = Params::new(
            Self::MEMORY_COST,
            Self::TIME_COST,
            Self::PARALLELISM,
            Some(Self::OUTPUT_LEN),
        )
        .expect("valid fixed Argon2 parameters");

        Self { params }
    }

    /// Custom cost parameters, for tests or constrained environments.
    pub fn with_params(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        let params = Params::new(memory_cost, time_cost, parallelism, Some(Self::OUTPUT_LEN))
            .expect("valid Argon2 parameters");
        Self { params }
    }

    pub async fn hash(&self, plaintext: String) -> Result<String, AppError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
            argon2
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {}", e)))?
    }

    pub async fn verify(&self, plaintext: String, digest: String) -> Result<bool, AppError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&digest) {
                Ok(parsed) => parsed,
                // A stored digest we cannot parse is a verification failure,
                // not a server error.
                Err(_) => return Ok(false),
            };
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
            Ok(argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {}", e)))?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
