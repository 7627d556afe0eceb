use crate::helpers::CryptoError;

/// bcrypt work factor for stored staff passwords.
pub const PASSWORD_HASH_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    hash_password_with_cost(password, PASSWORD_HASH_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, CryptoError> {
    bcrypt::hash(password, cost).map_err(|e| CryptoError::PasswordHashError(e.to_string()))
}

/// Compares a candidate password against a stored bcrypt hash. A mismatch is `Ok(false)`; errors mean the stored hash
/// itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CryptoError> {
    bcrypt::verify(password, hash).map_err(|e| CryptoError::PasswordHashError(e.to_string()))
}
