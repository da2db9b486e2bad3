//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Argon2 memory cost in KiB (19 MiB, the OWASP baseline)
pub const ARGON2_M_COST_KIB: u32 = 19_456;
/// Argon2 iteration count
pub const ARGON2_T_COST: u32 = 2;
/// Argon2 lanes
pub const ARGON2_P_COST: u32 = 1;

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// Stored hash is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(ARGON2_M_COST_KIB, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id
///
/// A fresh 16-byte salt is drawn from the OS RNG on every call, so hashing the
/// same password twice yields two different PHC strings. The work factor is
/// fixed by the `ARGON2_*` constants.
///
/// # Example
/// ```
/// use rolodex_auth::password::hash_password;
///
/// let hash = hash_password("secret1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC hash
///
/// The parameters embedded in `hash` are used for the recomputation, and the
/// final comparison is constant-time.
///
/// # Returns
/// * `Ok(true)` - Password matches hash
/// * `Ok(false)` - Password does not match hash
/// * `Err(PasswordError)` - If the stored hash is malformed
///
/// # Example
/// ```
/// use rolodex_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("secret1").unwrap();
/// assert!(verify_password("secret1", &hash).unwrap());
/// assert!(!verify_password("secret2", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}
