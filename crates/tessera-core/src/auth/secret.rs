use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a fresh refresh secret: 32 random bytes, hex-encoded.
///
/// Opaque by contract. Holders must never parse it; the store only ever
/// sees [`hash_secret`] of it.
pub fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hash a secret for safe database storage.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Unique access token identifier (`jti`).
pub fn generate_jti() -> String {
    Uuid::new_v4().simple().to_string()
}
