//! Data types that are stored in, or read from, the storefront database.
//!
//! `New*` types are the insert forms of each record. They carry no id or timestamps; the backend assigns those.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use wpg_common::MinorUnits;

//--------------------------------------   Statuses      ---------------------------------------------------------

/// Fulfillment state of an order. The discriminants match the seeded `statuses` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[repr(i64)]
pub enum OrderStatus {
    PendingFulfillment = 1,
    Refunded = 2,
    Cancelled = 3,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PendingFulfillment => write!(f, "Pending fulfillment"),
            OrderStatus::Refunded => write!(f, "Refunded"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// State of a card transaction. The discriminants match the seeded `transaction_statuses` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[repr(i64)]
pub enum TransactionStatus {
    Pending = 1,
    Cleared = 2,
    Declined = 3,
    Refunded = 4,
    PartiallyRefunded = 5,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Cleared => write!(f, "Cleared"),
            TransactionStatus::Declined => write!(f, "Declined"),
            TransactionStatus::Refunded => write!(f, "Refunded"),
            TransactionStatus::PartiallyRefunded => write!(f, "Partially refunded"),
        }
    }
}

//--------------------------------------   Widget       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Widget {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub inventory_level: i64,
    pub price: MinorUnits,
    pub image: String,
    pub is_recurring: bool,
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   Customer     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   Transaction  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: MinorUnits,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub bank_return_code: String,
    pub payment_intent: String,
    pub payment_method: String,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub bank_return_code: String,
    pub payment_intent: String,
    pub payment_method: String,
    #[sqlx(rename = "transaction_status_id")]
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub widget_id: i64,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub quantity: i64,
    pub amount: MinorUnits,
}

/// An order joined with its widget, transaction and customer. This is the shape used by the admin sales views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderDetail {
    pub id: i64,
    pub widget_id: i64,
    pub widget_name: String,
    pub is_recurring: bool,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub quantity: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub payment_intent: String,
    pub payment_method: String,
    pub bank_return_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   User         ---------------------------------------------------------
/// A staff account. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Changes to a staff account. The password hash is only replaced when one is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

//--------------------------------------   Tokens       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Authentication,
}

/// The persisted form of a login token. Only the SHA-256 hash of the plaintext is ever stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthToken {
    pub user_id: i64,
    pub email: String,
    pub token_hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

/// The user that owns a stored token, along with the token's expiry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TokenOwner {
    #[sqlx(flatten)]
    pub user: User,
    pub expiry: DateTime<Utc>,
}
