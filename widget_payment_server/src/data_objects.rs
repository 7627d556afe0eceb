use std::fmt::Display;

use serde::{Deserialize, Serialize};
use widget_payment_engine::{
    checkout_objects::{IssuedToken, Receipt},
    db_types::User,
    traits::{PaymentIntent, DEFAULT_PAGE_SIZE},
};
use wpg_common::MinorUnits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub currency: String,
    pub amount: MinorUnits,
}

/// What the browser needs to confirm a card payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(pi: PaymentIntent) -> Self {
        Self { id: pi.id, client_secret: pi.client_secret, amount: pi.amount, currency: pi.currency }
    }
}

/// Returned after a successful checkout. `receipt_url` is a short-lived sealed link to the receipt page. It is absent
/// only if the link could not be created, in which case the order has still been recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: i64,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptQuery {
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub authentication_token: IssuedToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRequest {
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub link: String,
    pub password: String,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserResponse {
    pub id: i64,
}
