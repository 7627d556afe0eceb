use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wpe_api::checkout_objects::Receipt;

/// Emitted after the settlement pipeline has durably written all three records of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreatedEvent {
    pub receipt: Receipt,
}

impl OrderCreatedEvent {
    pub fn new(receipt: Receipt) -> Self {
        Self { receipt }
    }
}

pub const DELETE_USER_ACTION: &str = "deleteUser";
pub const LOGOUT_ACTION: &str = "logout";
pub const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted";
pub const CONNECTED_MESSAGE: &str = "Connected To Server";

/// Everything that can be broadcast to connected admin clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    UserDeleted { user_id: i64, message: String },
}

impl AdminEvent {
    pub fn user_deleted(user_id: i64) -> Self {
        Self::UserDeleted { user_id, message: ACCOUNT_DELETED_MESSAGE.to_string() }
    }

    /// The message every connected client receives for this event.
    pub fn to_outbound(&self) -> OutboundMessage {
        match self {
            AdminEvent::UserDeleted { user_id, message } => OutboundMessage {
                action: Some(LOGOUT_ACTION.to_string()),
                message: message.clone(),
                user_id: Some(*user_id),
            },
        }
    }
}

/// A JSON frame sent by an admin client over its websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFrame {
    pub action: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown admin action: {0}")]
pub struct UnknownAdminAction(pub String);

impl TryFrom<AdminFrame> for AdminEvent {
    type Error = UnknownAdminAction;

    fn try_from(frame: AdminFrame) -> Result<Self, Self::Error> {
        match frame.action.as_str() {
            DELETE_USER_ACTION => Ok(AdminEvent::user_deleted(frame.user_id)),
            _ => Err(UnknownAdminAction(frame.action)),
        }
    }
}

/// The JSON shape written to admin websocket clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl OutboundMessage {
    pub fn greeting() -> Self {
        Self { action: None, message: CONNECTED_MESSAGE.to_string(), user_id: None }
    }
}
