use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::constants::{MIN_PASSWORD_LENGTH, PASSWORD_SYMBOLS};

// =============================================================================
// Password Policy
// =============================================================================

/// Check a password against the registration policy
///
/// A strong password:
/// - is at least `MIN_PASSWORD_LENGTH` characters long
/// - contains a lowercase letter, an uppercase letter, a digit and a symbol
///   from `PASSWORD_SYMBOLS`
/// - contains nothing outside ASCII letters, digits and `PASSWORD_SYMBOLS`
pub fn is_strong_password(password: &str) -> bool {
    let is_symbol = |c: char| PASSWORD_SYMBOLS.contains(c);

    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || is_symbol(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_symbol)
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password with Argon2id and a fresh random salt
///
/// Returns the PHC string (`$argon2id$v=19$...`), which carries the salt and
/// parameters needed to verify it later.
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| e.to_string())?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

/// Verify a password against a stored PHC hash
///
/// The comparison is constant-time inside `argon2`. A malformed stored hash
/// is reported as an error rather than a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a random throwaway password, created on first use
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password(&generate_session_token()).ok())
        .as_deref()
}

/// Run a full Argon2 verification that always fails
///
/// Used for logins naming an unknown account, so they take as long as a
/// wrong password for a real one.
pub fn verify_absent_password(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Generate a random bearer token (256 bits, hex encoded)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest used to key sessions, so raw tokens are never held in memory tables
///
/// `key = SHA256(token)`
pub fn session_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
