use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, User, UserUpdate},
    events::{AdminEvent, EventProducer},
    helpers::{hash_password_with_cost, PASSWORD_HASH_COST},
    traits::{PersistenceError, UserManagement},
    wpe_api::{errors::UserApiError, recovery_api::MIN_PASSWORD_LENGTH, user_objects::UserRequest},
};

/// Administration of staff accounts.
///
/// Deleting an account also revokes its tokens and, when a publisher is attached, tells every connected admin client
/// so that the deleted user is logged out everywhere.
pub struct UserApi<B> {
    db: B,
    notifier: Option<EventProducer<AdminEvent>>,
    password_cost: u32,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, notifier: None, password_cost: PASSWORD_HASH_COST }
    }

    pub fn with_notifier(mut self, notifier: EventProducer<AdminEvent>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    fn hash(&self, password: &str) -> Result<String, UserApiError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserApiError::Validation(format!(
                "Passwords must have at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(hash_password_with_cost(password, self.password_cost)?)
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub async fn users(&self) -> Result<Vec<User>, UserApiError> {
        Ok(self.db.fetch_users().await?)
    }

    pub async fn user(&self, user_id: i64) -> Result<User, UserApiError> {
        self.db.fetch_user(user_id).await?.ok_or(UserApiError::NotFound(user_id))
    }

    pub async fn add_user(&self, request: UserRequest) -> Result<i64, UserApiError> {
        request.validate().map_err(UserApiError::Validation)?;
        let password = request
            .new_password()
            .ok_or_else(|| UserApiError::Validation("A password is required for new accounts".into()))?;
        let user = NewUser {
            password_hash: self.hash(password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
        };
        let id = self.db.insert_user(user).await?;
        info!("🔐️ Staff account #{id} created");
        Ok(id)
    }

    pub async fn edit_user(&self, user_id: i64, request: UserRequest) -> Result<(), UserApiError> {
        request.validate().map_err(UserApiError::Validation)?;
        let password_hash = request.new_password().map(|p| self.hash(p)).transpose()?;
        let update = UserUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password_hash,
        };
        self.db.update_user(user_id, update).await.map_err(|e| match e {
            PersistenceError::NotFound(_) => UserApiError::NotFound(user_id),
            other => other.into(),
        })?;
        debug!("🔐️ Staff account #{user_id} updated");
        Ok(())
    }

    /// Deletes an account on behalf of `acting_user_id`. Users cannot delete themselves.
    pub async fn delete_user(&self, user_id: i64, acting_user_id: i64) -> Result<(), UserApiError> {
        if user_id == acting_user_id {
            return Err(UserApiError::Validation("You cannot delete your own account".into()));
        }
        self.db.delete_user(user_id).await.map_err(|e| match e {
            PersistenceError::NotFound(_) => UserApiError::NotFound(user_id),
            other => other.into(),
        })?;
        info!("🔐️ Staff account #{user_id} deleted by #{acting_user_id}");
        if let Some(notifier) = &self.notifier {
            notifier.try_publish_event(AdminEvent::user_deleted(user_id));
        }
        Ok(())
    }

    /// Creates the first staff account if there are none yet. Returns the new id, or `None` if accounts already exist.
    pub async fn ensure_admin(&self, request: UserRequest) -> Result<Option<i64>, UserApiError> {
        if !self.db.fetch_users().await?.is_empty() {
            return Ok(None);
        }
        let id = self.add_user(request).await?;
        warn!("🔐️ No staff accounts existed, so an initial administrator (#{id}) was created");
        Ok(Some(id))
    }
}
