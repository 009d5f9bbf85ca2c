//! Argon2id credential hashing for the login flow.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rayerp_application::PasswordHasher as PasswordHasherPort;
use rayerp_core::{AppError, AppResult};

/// Memory cost in KiB (19 MiB), the OWASP interactive-login profile.
const MEMORY_COST_KIB: u32 = 19_456;
/// Iteration count.
const TIME_COST: u32 = 2;
/// Lane count; login verification is latency-bound, one lane is enough.
const PARALLELISM: u32 = 1;

/// Hashes and verifies passwords with Argon2id.
///
/// Every hash carries a fresh random salt, so equal passwords never
/// produce equal strings.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates a hasher tuned for interactive logins.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))?;

        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        // A mismatch is a normal outcome; only structural failures are
        // surfaced as errors.
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}
