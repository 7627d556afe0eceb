use serde::{Deserialize, Serialize};
use thiserror::Error;
use wpg_common::MinorUnits;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The card processor refused the operation. The message is meant for the buyer and is shown verbatim.
    #[error("{0}")]
    Declined(String),
    #[error("Could not reach the payment gateway. {0}")]
    Network(String),
    #[error("The payment gateway returned an unexpected response. {0}")]
    InvalidResponse(String),
    #[error("'{0}' is not a valid payment gateway id")]
    InvalidId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the browser so it can confirm the card payment. Only present on newly created intents.
    pub client_secret: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: String,
    /// The id of the most recent charge, used as the bank return code.
    pub latest_charge: Option<String>,
}

/// The card details the gateway holds for a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodDetails {
    pub id: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: String,
}

/// An opaque card processor. Implementations are expected to bound every call with a deadline.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a payment intent for the given amount. The browser completes the charge with the returned secret.
    async fn create_payment_intent(&self, currency: &str, amount: MinorUnits) -> Result<PaymentIntent, GatewayError>;
    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, GatewayError>;
    async fn fetch_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethodDetails, GatewayError>;
    /// Creates a gateway customer with the given payment method attached as the default.
    async fn create_customer(&self, payment_method_id: &str, email: &str) -> Result<GatewayCustomer, GatewayError>;
    async fn subscribe(
        &self,
        customer: &GatewayCustomer,
        plan_id: &str,
        email: &str,
        last_four: &str,
    ) -> Result<GatewaySubscription, GatewayError>;
    async fn refund(&self, payment_intent_id: &str, amount: MinorUnits) -> Result<(), GatewayError>;
    /// Cancels the subscription at the end of the current billing period.
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), GatewayError>;
}
