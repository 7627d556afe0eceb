use serde::{Deserialize, Serialize};

use crate::wpe_api::checkout_objects::validate_email;

/// Staff account details as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Required for new accounts. When editing, the password is left unchanged if this is absent or empty.
    #[serde(default)]
    pub password: Option<String>,
}

impl UserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("A first and last name are required".into());
        }
        validate_email(&self.email)
    }

    /// The new password, if one was actually supplied.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}
