//! Staff login and bearer-token authentication.
//!
//! A successful login issues a random 26-character token. The client keeps the plaintext; the backend keeps only its
//! SHA-256 hash, and issuing a new token revokes any earlier one for the same user. Requests then authenticate with
//! an `Authorization: Bearer <token>` header.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::User,
    helpers::{hash_token, parse_bearer_header, verify_password, LoginToken, TOKEN_LENGTH},
    traits::AuthManagement,
    wpe_api::{checkout_objects::IssuedToken, errors::AuthApiError},
};

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

pub struct AuthApi<B> {
    db: B,
    token_ttl: Duration,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?}, tokens live for {})", self.db, self.token_ttl)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B, token_ttl: Duration) -> Self {
        Self { db, token_ttl }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Checks the e-mail and password, then issues and stores a fresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AuthApiError> {
        let user = self.db.fetch_user_by_email(email).await?.ok_or(AuthApiError::UserNotFound)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(AuthApiError::InvalidPassword);
        }
        let token = LoginToken::generate(user.id, &user.email, self.token_ttl);
        self.db.insert_token(&token.record).await?;
        info!("🔐️ User #{} logged in. Their token expires at {}", user.id, token.expiry());
        let issued = IssuedToken { expiry: token.expiry(), token: token.plaintext };
        Ok((user, issued))
    }

    /// Resolves the user behind an `Authorization` header value.
    ///
    /// The header is checked for shape and token length before the backend is consulted.
    pub async fn authenticate_bearer(&self, header: &str) -> Result<User, AuthApiError> {
        let token = parse_bearer_header(header)?;
        self.authenticate_token(token).await
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<User, AuthApiError> {
        if token.len() != TOKEN_LENGTH {
            return Err(AuthApiError::InvalidTokenLength(token.len()));
        }
        let owner = self.db.fetch_token_owner(&hash_token(token)).await?.ok_or(AuthApiError::TokenNotFound)?;
        if owner.expiry <= Utc::now() {
            return Err(AuthApiError::TokenExpired(owner.expiry));
        }
        trace!("🔐️ Token accepted for user #{}", owner.user.id);
        Ok(owner.user)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        db_types::{NewAuthToken, TokenOwner},
        helpers::hash_password_with_cost,
        wpe_api::test_mocks::MockAuthBackend,
    };

    fn user(password: &str) -> User {
        User {
            id: 1,
            first_name: "Admin".into(),
            last_name: "User".into(),
            email: "admin@example.com".into(),
            password_hash: hash_password_with_cost(password, 4).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// A backend that remembers only the most recent token, as the real one does.
    fn single_token_backend(password: &str) -> MockAuthBackend {
        let account = user(password);
        let stored: Arc<Mutex<Option<NewAuthToken>>> = Arc::new(Mutex::new(None));
        let mut db = MockAuthBackend::new();
        let u = account.clone();
        db.expect_fetch_user_by_email().returning(move |_| Ok(Some(u.clone())));
        let sink = stored.clone();
        db.expect_insert_token().returning(move |t| {
            *sink.lock().unwrap() = Some(t.clone());
            Ok(())
        });
        db.expect_fetch_token_owner().returning(move |hash| {
            let owner = stored
                .lock()
                .unwrap()
                .as_ref()
                .filter(|t| t.token_hash.as_slice() == hash)
                .map(|t| TokenOwner { user: account.clone(), expiry: t.expiry });
            Ok(owner)
        });
        db
    }

    #[tokio::test]
    async fn short_tokens_are_rejected_before_any_lookup() {
        let mut db = MockAuthBackend::new();
        db.expect_fetch_token_owner().never();
        let api = AuthApi::new(db, Duration::hours(24));
        let err = api.authenticate_bearer("Bearer short").await.unwrap_err();
        assert!(matches!(err, AuthApiError::InvalidTokenLength(5)));
        assert!(err.is_credential_failure());
        let err = api.authenticate_bearer("Token ABCDEFGHIJKLMNOPQRSTUVWXYZ").await.unwrap_err();
        assert!(matches!(err, AuthApiError::MalformedHeader));
    }

    #[tokio::test]
    async fn issued_token_verifies_and_others_do_not() {
        let _ = env_logger::try_init();
        let api = AuthApi::new(single_token_backend("secret"), Duration::hours(24));
        let (user, issued) = api.login("admin@example.com", "secret").await.unwrap();
        assert_eq!(issued.token.len(), TOKEN_LENGTH);
        let found = api.authenticate_bearer(&format!("Bearer {}", issued.token)).await.unwrap();
        assert_eq!(found.id, user.id);
        let other = "A".repeat(TOKEN_LENGTH);
        assert!(matches!(api.authenticate_token(&other).await, Err(AuthApiError::TokenNotFound)));
    }

    #[tokio::test]
    async fn a_second_login_revokes_the_first_token() {
        let api = AuthApi::new(single_token_backend("secret"), Duration::hours(24));
        let (_, first) = api.login("admin@example.com", "secret").await.unwrap();
        let (_, second) = api.login("admin@example.com", "secret").await.unwrap();
        assert!(matches!(api.authenticate_token(&first.token).await, Err(AuthApiError::TokenNotFound)));
        assert!(api.authenticate_token(&second.token).await.is_ok());
    }

    #[tokio::test]
    async fn expired_tokens_fail_even_when_the_hash_matches() {
        let api = AuthApi::new(single_token_backend("secret"), Duration::seconds(-1));
        let (_, issued) = api.login("admin@example.com", "secret").await.unwrap();
        assert!(matches!(api.authenticate_token(&issued.token).await, Err(AuthApiError::TokenExpired(_))));
    }

    #[tokio::test]
    async fn wrong_password_issues_nothing() {
        let mut db = MockAuthBackend::new();
        let u = user("secret");
        db.expect_fetch_user_by_email().returning(move |_| Ok(Some(u.clone())));
        db.expect_insert_token().never();
        let api = AuthApi::new(db, Duration::hours(24));
        assert!(matches!(api.login("admin@example.com", "guess").await, Err(AuthApiError::InvalidPassword)));
    }

    #[tokio::test]
    async fn unknown_user() {
        let mut db = MockAuthBackend::new();
        db.expect_fetch_user_by_email().returning(|_| Ok(None));
        let api = AuthApi::new(db, Duration::hours(24));
        let err = api.login("nobody@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, AuthApiError::UserNotFound));
        assert!(err.is_credential_failure());
    }
}
