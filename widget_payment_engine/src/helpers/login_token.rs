use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{
    db_types::{NewAuthToken, TokenScope},
    wpe_api::errors::AuthApiError,
};

/// Number of random bytes behind every token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;
/// Length of a token's plaintext: 16 bytes in unpadded base32.
pub const TOKEN_LENGTH: usize = 26;
pub const BEARER_SCHEME: &str = "Bearer";

/// A freshly issued login token.
///
/// The plaintext is handed to the client exactly once. Only `record`, which carries the hash, is persisted.
#[derive(Debug, Clone)]
pub struct LoginToken {
    pub plaintext: String,
    pub record: NewAuthToken,
}

impl LoginToken {
    pub fn generate(user_id: i64, email: &str, ttl: Duration) -> Self {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plaintext = BASE32_NOPAD.encode(&bytes);
        let record = NewAuthToken {
            user_id,
            email: email.to_string(),
            token_hash: hash_token(&plaintext),
            expiry: Utc::now() + ttl,
            scope: TokenScope::Authentication,
        };
        Self { plaintext, record }
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.record.expiry
    }
}

/// The stored form of a token: the SHA-256 digest of its plaintext.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// This is purely structural. No lookups are made, so malformed credentials are rejected without touching the store.
pub fn parse_bearer_header(header: &str) -> Result<&str, AuthApiError> {
    let parts = header.split(' ').collect::<Vec<&str>>();
    if parts.len() != 2 || parts[0] != BEARER_SCHEME {
        return Err(AuthApiError::MalformedHeader);
    }
    let token = parts[1];
    if token.len() != TOKEN_LENGTH {
        return Err(AuthApiError::InvalidTokenLength(token.len()));
    }
    Ok(token)
}
