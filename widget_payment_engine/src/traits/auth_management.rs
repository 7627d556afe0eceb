use crate::{
    db_types::{NewAuthToken, TokenOwner, User},
    traits::PersistenceError,
};

/// The `AuthManagement` trait defines the storage behaviour behind staff authentication.
///
/// Bearer tokens are never stored in plaintext. Backends only ever see the SHA-256 hash of a token, and look tokens up
/// by that hash.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Fetches a staff account by e-mail address, returning `Ok(None)` if there is no such account.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError>;

    /// Replaces the password hash for the given user.
    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), PersistenceError>;

    /// Stores a new token for its owner. Every token previously issued to the same user is deleted first, in the same
    /// atomic transaction, so that each user holds at most one live credential.
    async fn insert_token(&self, token: &NewAuthToken) -> Result<(), PersistenceError>;

    /// Looks up the owner of the token with the given hash. Expired tokens are still returned, so that callers can
    /// tell an expired token apart from an unknown one.
    async fn fetch_token_owner(&self, token_hash: &[u8]) -> Result<Option<TokenOwner>, PersistenceError>;
}
