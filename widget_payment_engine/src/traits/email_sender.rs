use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid e-mail address: {0}")]
    InvalidAddress(String),
    #[error("Could not build the message. {0}")]
    MessageError(String),
    #[error("Mail delivery failed. {0}")]
    DeliveryError(String),
}

/// A transactional e-mail. `template` names the message kind; `data` holds the values it is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: BTreeMap<String, String>,
}

impl OutgoingEmail {
    pub fn new(from: &str, to: &str, subject: &str, template: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            template: template.to_string(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[allow(async_fn_in_trait)]
pub trait EmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}
