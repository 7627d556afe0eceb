//! Password recovery through signed, expiring links.
//!
//! A reset link looks like `{frontend}/reset-password?email=<encrypted address>&hash=<signature>`. The address is
//! encrypted so it doesn't appear in logs or browser history, and the whole link is signed so it can't be altered.
//! Resetting a password walks the link through a fixed sequence of checks:
//!
//! 1. the signature is valid,
//! 2. the link has not expired,
//! 3. the e-mail address decrypts,
//! 4. the password is updated.
//!
//! Only the last step writes anything, so a link that fails any check leaves the account untouched.
use std::fmt::Debug;

use log::*;
use url::Url;

use crate::{
    db_types::User,
    helpers::{hash_password_with_cost, CryptoError, Encryption, UrlSigner, PASSWORD_HASH_COST},
    traits::{AuthManagement, EmailSender, OutgoingEmail},
    wpe_api::errors::RecoveryError,
};

pub const RESET_TEMPLATE: &str = "password-reset";
pub const RESET_SUBJECT: &str = "Password reset request";
pub const DEFAULT_LINK_EXPIRY_MINUTES: i64 = 60;
pub const MIN_PASSWORD_LENGTH: usize = 6;
const EMAIL_PARAM: &str = "email";

#[derive(Debug, Clone)]
pub struct RecoverySettings {
    /// Base URL of the web front end that serves the reset page.
    pub frontend_url: String,
    pub mail_from: String,
    pub link_expiry_minutes: i64,
    pub password_cost: u32,
}

impl RecoverySettings {
    pub fn new(frontend_url: &str, mail_from: &str) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            mail_from: mail_from.to_string(),
            link_expiry_minutes: DEFAULT_LINK_EXPIRY_MINUTES,
            password_cost: PASSWORD_HASH_COST,
        }
    }

    pub fn with_link_expiry(mut self, minutes: i64) -> Self {
        self.link_expiry_minutes = minutes;
        self
    }
}

pub struct AccountRecoveryApi<B, M> {
    db: B,
    mailer: M,
    signer: UrlSigner,
    encryption: Encryption,
    settings: RecoverySettings,
}

impl<B, M> Debug for AccountRecoveryApi<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountRecoveryApi ({:?})", self.settings)
    }
}

impl<B, M> AccountRecoveryApi<B, M> {
    pub fn new(db: B, mailer: M, signer: UrlSigner, encryption: Encryption, settings: RecoverySettings) -> Self {
        Self { db, mailer, signer, encryption, settings }
    }

    /// Builds a signed reset link for the given address.
    pub fn reset_link(&self, email: &str) -> Result<String, RecoveryError> {
        let encrypted = self.encryption.encrypt(email).map_err(RecoveryError::LinkCreation)?;
        let base = format!("{}/reset-password", self.settings.frontend_url);
        let url = Url::parse_with_params(&base, &[(EMAIL_PARAM, encrypted)])
            .map_err(|e| RecoveryError::LinkCreation(CryptoError::MalformedLink(e.to_string())))?;
        Ok(self.signer.sign(url.as_str()))
    }

    /// Checks the signature, then the age, of a reset link.
    pub fn verify_reset_link(&self, link: &str) -> Result<(), RecoveryError> {
        self.signer.verify_fresh(link, self.settings.link_expiry_minutes)?;
        Ok(())
    }

    /// Recovers the e-mail address from a link that has passed [`Self::verify_reset_link`].
    fn email_from_link(&self, payload: &str) -> Result<String, RecoveryError> {
        let url = Url::parse(payload).map_err(|e| RecoveryError::MalformedLink(e.to_string()))?;
        let encrypted = url
            .query_pairs()
            .find(|(k, _)| k == EMAIL_PARAM)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| RecoveryError::MalformedLink("The link carries no e-mail address".into()))?;
        self.encryption.decrypt(&encrypted).map_err(RecoveryError::EmailDecryption)
    }
}

impl<B, M> AccountRecoveryApi<B, M>
where
    B: AuthManagement,
    M: EmailSender,
{
    /// E-mails a reset link to the owner of `email`. Fails with [`RecoveryError::UnknownEmail`] if there is no such
    /// account.
    pub async fn request_reset(&self, email: &str) -> Result<(), RecoveryError> {
        let user = self.db.fetch_user_by_email(email).await?.ok_or(RecoveryError::UnknownEmail)?;
        let link = self.reset_link(&user.email)?;
        let message = OutgoingEmail::new(&self.settings.mail_from, &user.email, RESET_SUBJECT, RESET_TEMPLATE)
            .with_data("link", link)
            .with_data("first_name", user.first_name.as_str())
            .with_data("expires_in_minutes", self.settings.link_expiry_minutes.to_string());
        self.mailer.send(message).await?;
        info!("🔐️ Password reset link sent to user #{}", user.id);
        Ok(())
    }

    /// Sets a new password for the account named in a reset link.
    pub async fn reset_password(&self, link: &str, new_password: &str) -> Result<User, RecoveryError> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RecoveryError::WeakPassword(format!(
                "Passwords must have at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let signed = self.signer.verify_fresh(link, self.settings.link_expiry_minutes).map_err(|e| {
            debug!("🔐️ Reset link rejected. {e}");
            RecoveryError::from(e)
        })?;
        let email = self.email_from_link(&signed.payload)?;
        let user = self.db.fetch_user_by_email(&email).await?.ok_or(RecoveryError::UnknownEmail)?;
        let hash = hash_password_with_cost(new_password, self.settings.password_cost)
            .map_err(RecoveryError::PasswordHash)?;
        self.db.update_password(user.id, &hash).await?;
        info!("🔐️ Password reset for user #{}", user.id);
        Ok(user)
    }
}
