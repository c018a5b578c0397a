/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt. The cost factor comes from configuration.

use bcrypt::{hash, verify};

use crate::error::AppError;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// `cost` is clamped into bcrypt's supported range.
    pub fn new(cost: u32) -> Self {
        let cost = cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST);
        if cost == MIN_BCRYPT_COST {
            tracing::warn!(cost, "bcrypt cost is at the minimum, hashes are cheap to brute force");
        }
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt
    ///
    /// The result encodes algorithm version, cost, salt and digest.
    ///
    /// # Errors
    /// Returns error if bcrypt hashing fails
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its stored hash
    ///
    /// A malformed hash counts as a mismatch.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match verify(password, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be checked");
                false
            }
        }
    }
}
