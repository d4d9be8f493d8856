use rand::Rng;
use sha2::{Digest, Sha256};

/// Fresh reset token: 32 random bytes, hex encoded. Only its hash is stored.
pub fn generate_reset_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Hex SHA-256 of the raw token, as persisted in `users.reset_token`.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
