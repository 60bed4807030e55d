use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Longest password accepted, in bytes. Keeps hashing time bounded.
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Hash with Argon2id and a fresh random salt. The result is a PHC string
/// carrying algorithm, params and salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    anyhow::ensure!(
        plain.len() <= MAX_PASSWORD_BYTES,
        "password exceeds {MAX_PASSWORD_BYTES} bytes"
    );
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch or an overlong candidate; `Err` only when the
/// stored hash can't be parsed.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
