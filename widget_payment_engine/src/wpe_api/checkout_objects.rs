use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wpg_common::MinorUnits;

use crate::db_types::{NewCustomer, NewOrder, NewTransaction, OrderStatus, TransactionStatus};

/// Everything the settlement pipeline needs to record a confirmed charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeDescription {
    pub widget_id: i64,
    pub quantity: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub payment_intent: String,
    pub payment_method: String,
    pub bank_return_code: String,
}

impl ChargeDescription {
    /// Structural checks made before anything is written.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_positive() {
            return Err(format!("The amount must be positive, but was {}", self.amount));
        }
        if self.quantity < 1 {
            return Err("The quantity must be at least 1".into());
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("'{}' is not a currency code", self.currency));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("A first and last name are required".into());
        }
        validate_email(&self.email)?;
        if self.payment_intent.is_empty() || self.payment_method.is_empty() {
            return Err("The payment intent and payment method are required".into());
        }
        Ok(())
    }

    pub fn customer(&self) -> NewCustomer {
        NewCustomer {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn transaction(&self) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            currency: self.currency.clone(),
            last_four: self.last_four.clone(),
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
            bank_return_code: self.bank_return_code.clone(),
            payment_intent: self.payment_intent.clone(),
            payment_method: self.payment_method.clone(),
            status: TransactionStatus::Cleared,
        }
    }

    pub fn order(&self, customer_id: i64, transaction_id: i64) -> NewOrder {
        NewOrder {
            widget_id: self.widget_id,
            transaction_id,
            customer_id,
            status: OrderStatus::PendingFulfillment,
            quantity: self.quantity,
            amount: self.amount,
        }
    }
}

pub(crate) fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace) => {
            Ok(())
        },
        _ => Err(format!("'{email}' is not a valid e-mail address")),
    }
}

/// The ids of the three records written by one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub customer_id: i64,
    pub transaction_id: i64,
    pub order_id: i64,
}

/// What the buyer sees after paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub order_id: i64,
    pub customer_id: i64,
    pub transaction_id: i64,
    pub widget_id: i64,
    pub quantity: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub last_four: String,
    pub payment_intent: String,
    pub bank_return_code: String,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(charge: &ChargeDescription, settlement: Settlement) -> Self {
        Self {
            order_id: settlement.order_id,
            customer_id: settlement.customer_id,
            transaction_id: settlement.transaction_id,
            widget_id: charge.widget_id,
            quantity: charge.quantity,
            amount: charge.amount,
            currency: charge.currency.clone(),
            first_name: charge.first_name.clone(),
            last_name: charge.last_name.clone(),
            email: charge.email.clone(),
            last_four: charge.last_four.clone(),
            payment_intent: charge.payment_intent.clone(),
            bank_return_code: charge.bank_return_code.clone(),
            created_at: Utc::now(),
        }
    }
}

fn default_quantity() -> i64 {
    1
}

/// A storefront purchase, submitted once the browser has confirmed the payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontPayment {
    pub widget_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
}

/// A charge keyed in by staff through the virtual terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalPayment {
    pub widget_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub widget_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub order_id: i64,
    pub payment_intent: String,
    pub amount: MinorUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub order_id: i64,
    /// Subscriptions are recorded with the subscription id in the transaction's payment intent column.
    pub subscription_id: String,
}

/// A login token as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

/// Gateway-side operations that are followed by a local status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayAction {
    Refund,
    CancelSubscription,
}

impl Display for GatewayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayAction::Refund => write!(f, "refund"),
            GatewayAction::CancelSubscription => write!(f, "subscription cancellation"),
        }
    }
}
