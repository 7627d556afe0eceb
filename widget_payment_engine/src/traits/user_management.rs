use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::PersistenceError,
};

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// All staff accounts, ordered by last name then first name.
    async fn fetch_users(&self) -> Result<Vec<User>, PersistenceError>;
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, PersistenceError>;
    /// Stores a new account and returns its id. Fails with a constraint violation if the e-mail is already in use.
    async fn insert_user(&self, user: NewUser) -> Result<i64, PersistenceError>;
    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<(), PersistenceError>;
    /// Deletes the account along with all of its tokens.
    async fn delete_user(&self, user_id: i64) -> Result<(), PersistenceError>;
}
