//! A [`PaymentGateway`] backed by the Stripe REST API.
//!
//! Requests are form-encoded and authenticated with the secret key as the basic-auth user name. Every request is
//! bounded by the client timeout from [`StripeConfig`]; nothing is retried.
use std::sync::Arc;

use log::*;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use widget_payment_engine::traits::{
    GatewayCustomer,
    GatewayError,
    GatewaySubscription,
    PaymentGateway,
    PaymentIntent,
    PaymentMethodDetails,
};
use wpg_common::MinorUnits;

use crate::{config::StripeConfig, errors::ServerError};

#[derive(Clone)]
pub struct StripeGateway {
    config: StripeConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StripeGateway({})", self.config.api_url)
    }
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the Stripe client. {e}")))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// The path of a single object. Ids come from clients, so only Stripe's own id alphabet is let through.
    fn object_path(collection: &str, id: &str) -> Result<String, GatewayError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GatewayError::InvalidId(id.to_string()));
        }
        Ok(format!("{collection}/{id}"))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        trace!("💳️ {method} {url}");
        let mut req = self.client.request(method, url).basic_auth(self.config.secret.reveal(), None::<&str>);
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| GatewayError::Network(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| GatewayError::Network(e.to_string()))?;
        if status.is_success() {
            serde_json::from_str::<T>(&body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
        } else {
            Err(error_from_response(status, &body))
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Card errors become [`GatewayError::Declined`] so their message reaches the buyer. Anything else is treated as an
/// unexpected response.
fn error_from_response(status: StatusCode, body: &str) -> GatewayError {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(StripeErrorBody { error }) if error.kind == "card_error" || status == StatusCode::PAYMENT_REQUIRED => {
            debug!("💳️ Stripe declined the request. {}", error.message);
            GatewayError::Declined(error.message)
        },
        Ok(StripeErrorBody { error }) => {
            warn!("💳️ Stripe returned {status}. {}: {}", error.kind, error.message);
            GatewayError::InvalidResponse(format!("{status}. {}", error.message))
        },
        Err(_) => {
            warn!("💳️ Stripe returned {status} with an unreadable body");
            GatewayError::InvalidResponse(status.to_string())
        },
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    latest_charge: Option<String>,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        Self {
            id: pi.id,
            client_secret: pi.client_secret,
            amount: MinorUnits::from(pi.amount),
            currency: pi.currency,
            status: pi.status,
            latest_charge: pi.latest_charge,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentMethod {
    id: String,
    card: Option<StripeCard>,
}

#[derive(Debug, Deserialize)]
struct StripeCard {
    last4: String,
    exp_month: i64,
    exp_year: i64,
}

impl TryFrom<StripePaymentMethod> for PaymentMethodDetails {
    type Error = GatewayError;

    fn try_from(pm: StripePaymentMethod) -> Result<Self, Self::Error> {
        let card = pm
            .card
            .ok_or_else(|| GatewayError::InvalidResponse(format!("Payment method {} is not a card", pm.id)))?;
        Ok(Self { id: pm.id, last_four: card.last4, expiry_month: card.exp_month, expiry_year: card.exp_year })
    }
}

#[derive(Debug, Deserialize)]
struct StripeObject {
    id: String,
    #[serde(default)]
    status: String,
}

impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, currency: &str, amount: MinorUnits) -> Result<PaymentIntent, GatewayError> {
        let form = [
            ("amount", amount.value().to_string()),
            ("currency", currency.to_lowercase()),
            ("payment_method_types[]", "card".to_string()),
        ];
        let intent = self.request::<StripePaymentIntent>(Method::POST, "payment_intents", &form).await?;
        debug!("💳️ Created payment intent {}", intent.id);
        Ok(intent.into())
    }

    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let path = Self::object_path("payment_intents", payment_intent_id)?;
        let intent = self.request::<StripePaymentIntent>(Method::GET, &path, &[]).await?;
        Ok(intent.into())
    }

    async fn fetch_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethodDetails, GatewayError> {
        let path = Self::object_path("payment_methods", payment_method_id)?;
        self.request::<StripePaymentMethod>(Method::GET, &path, &[]).await?.try_into()
    }

    async fn create_customer(&self, payment_method_id: &str, email: &str) -> Result<GatewayCustomer, GatewayError> {
        let form = [
            ("payment_method", payment_method_id.to_string()),
            ("email", email.to_string()),
            ("invoice_settings[default_payment_method]", payment_method_id.to_string()),
        ];
        let customer = self.request::<StripeObject>(Method::POST, "customers", &form).await?;
        debug!("💳️ Created gateway customer {}", customer.id);
        Ok(GatewayCustomer { id: customer.id })
    }

    async fn subscribe(
        &self,
        customer: &GatewayCustomer,
        plan_id: &str,
        email: &str,
        last_four: &str,
    ) -> Result<GatewaySubscription, GatewayError> {
        let form = [
            ("customer", customer.id.clone()),
            ("items[0][plan]", plan_id.to_string()),
            ("metadata[email]", email.to_string()),
            ("metadata[last_four]", last_four.to_string()),
        ];
        let sub = self.request::<StripeObject>(Method::POST, "subscriptions", &form).await?;
        Ok(GatewaySubscription { id: sub.id, status: sub.status })
    }

    async fn refund(&self, payment_intent_id: &str, amount: MinorUnits) -> Result<(), GatewayError> {
        let form = [("payment_intent", payment_intent_id.to_string()), ("amount", amount.value().to_string())];
        let refund = self.request::<StripeObject>(Method::POST, "refunds", &form).await?;
        debug!("💳️ Refund {} is {}", refund.id, refund.status);
        Ok(())
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), GatewayError> {
        let path = Self::object_path("subscriptions", subscription_id)?;
        let form = [("cancel_at_period_end", "true".to_string())];
        self.request::<StripeObject>(Method::POST, &path, &form).await?;
        Ok(())
    }
}
