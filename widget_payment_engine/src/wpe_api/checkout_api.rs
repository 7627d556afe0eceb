//! The checkout settlement pipeline and the payment flows built on it.
//!
//! Every successful charge ends in [`CheckoutApi::settle`], which writes a customer, a transaction and an order, in
//! that order. Each write depends on the id produced by the one before it. There is no compensation: if a later stage
//! fails, the earlier rows stay where they are and the ids that were committed are logged at error level so that the
//! charge can be reconciled by hand. A paid charge must never lose its records.
use std::fmt::Debug;

use log::*;
use wpg_common::MinorUnits;

use crate::{
    db_types::{OrderStatus, Widget},
    events::{EventProducers, OrderCreatedEvent},
    traits::{CheckoutManagement, PaymentGateway, PaymentIntent},
    wpe_api::{
        checkout_objects::{
            validate_email,
            CancelSubscriptionRequest,
            ChargeDescription,
            GatewayAction,
            Receipt,
            RefundRequest,
            Settlement,
            StorefrontPayment,
            SubscriptionRequest,
            TerminalPayment,
        },
        errors::CheckoutError,
    },
};

const PAYMENT_SUCCEEDED: &str = "succeeded";
/// The most widgets a single storefront order may contain.
pub const MAX_QUANTITY: i64 = 1_000;

pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    /// Starts a storefront charge. The returned intent carries the client secret the browser needs to confirm it.
    pub async fn create_payment_intent(&self, currency: &str, amount: MinorUnits) -> Result<PaymentIntent, CheckoutError> {
        if !amount.is_positive() {
            return Err(CheckoutError::Validation(format!("Cannot charge {amount}")));
        }
        let intent = self.gateway.create_payment_intent(currency, amount).await?;
        debug!("🛒️ Payment intent {} created for {amount} {currency}", intent.id);
        Ok(intent)
    }

    pub async fn fetch_widget(&self, widget_id: i64) -> Result<Widget, CheckoutError> {
        self.db
            .fetch_widget(widget_id)
            .await
            .map_err(CheckoutError::WidgetLookup)?
            .ok_or(CheckoutError::WidgetNotFound(widget_id))
    }

    /// Records a confirmed charge as a customer, a transaction and an order.
    pub async fn settle(&self, charge: &ChargeDescription) -> Result<Settlement, CheckoutError> {
        let receipt = self.record(charge).await?;
        Ok(Settlement {
            customer_id: receipt.customer_id,
            transaction_id: receipt.transaction_id,
            order_id: receipt.order_id,
        })
    }

    /// Completes a storefront purchase once the browser has confirmed the payment.
    ///
    /// The widget price, the payment intent and the card details are all taken from trusted sources (the database
    /// and the gateway) and checked against what the client sent.
    pub async fn storefront_checkout(&self, payment: StorefrontPayment) -> Result<Receipt, CheckoutError> {
        if !(1..=MAX_QUANTITY).contains(&payment.quantity) {
            return Err(CheckoutError::Validation(format!("The quantity must be between 1 and {MAX_QUANTITY}")));
        }
        let widget = self.fetch_widget(payment.widget_id).await?;
        if widget.is_recurring {
            return Err(CheckoutError::Validation(format!("{} is sold as a subscription", widget.name)));
        }
        let expected = widget
            .price
            .checked_mul(payment.quantity)
            .ok_or_else(|| CheckoutError::Validation(format!("{} x {} is too large an order", payment.quantity, widget.name)))?;
        if payment.amount != expected {
            return Err(CheckoutError::PriceMismatch { expected, actual: payment.amount });
        }
        let intent = self.confirmed_intent(&payment.payment_intent, payment.amount, &payment.currency).await?;
        let card = self.gateway.fetch_payment_method(&payment.payment_method).await?;
        let charge = ChargeDescription {
            widget_id: widget.id,
            quantity: payment.quantity,
            amount: payment.amount,
            currency: payment.currency,
            first_name: payment.first_name,
            last_name: payment.last_name,
            email: payment.email,
            last_four: card.last_four,
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            payment_intent: intent.id,
            payment_method: payment.payment_method,
            bank_return_code: intent.latest_charge.unwrap_or_default(),
        };
        self.record(&charge).await
    }

    /// Records a charge keyed in by staff. The widget is not looked up, and the card details come from the gateway's
    /// payment method record rather than from the request.
    pub async fn virtual_terminal_checkout(&self, payment: TerminalPayment) -> Result<Receipt, CheckoutError> {
        let intent = self.confirmed_intent(&payment.payment_intent, payment.amount, &payment.currency).await?;
        let card = self.gateway.fetch_payment_method(&payment.payment_method).await?;
        let charge = ChargeDescription {
            widget_id: payment.widget_id,
            quantity: 1,
            amount: payment.amount,
            currency: payment.currency,
            first_name: payment.first_name,
            last_name: payment.last_name,
            email: payment.email,
            last_four: card.last_four,
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            payment_intent: intent.id,
            payment_method: payment.payment_method,
            bank_return_code: intent.latest_charge.unwrap_or_default(),
        };
        self.record(&charge).await
    }

    /// Signs the buyer up for a recurring widget. The subscription id takes the place of the payment intent on the
    /// transaction record.
    pub async fn subscribe_to_plan(&self, request: SubscriptionRequest) -> Result<Receipt, CheckoutError> {
        if request.first_name.trim().len() < 2 {
            return Err(CheckoutError::Validation("The first name must be at least 2 characters".into()));
        }
        validate_email(&request.email).map_err(CheckoutError::Validation)?;
        let widget = self.fetch_widget(request.widget_id).await?;
        if !widget.is_recurring || widget.plan_id.is_empty() {
            return Err(CheckoutError::Validation(format!("{} is not a subscription plan", widget.name)));
        }
        if request.amount != widget.price {
            return Err(CheckoutError::PriceMismatch { expected: widget.price, actual: request.amount });
        }
        let card = self.gateway.fetch_payment_method(&request.payment_method).await?;
        let customer = self.gateway.create_customer(&request.payment_method, &request.email).await?;
        let subscription =
            self.gateway.subscribe(&customer, &widget.plan_id, &request.email, &card.last_four).await?;
        info!("🛒️ Gateway customer {} subscribed to {} as {}", customer.id, widget.plan_id, subscription.id);
        let charge = ChargeDescription {
            widget_id: widget.id,
            quantity: 1,
            amount: request.amount,
            currency: request.currency,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            last_four: card.last_four,
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            payment_intent: subscription.id,
            payment_method: request.payment_method,
            bank_return_code: String::new(),
        };
        self.record(&charge).await
    }

    /// Refunds a charge at the gateway, then marks the order as refunded.
    pub async fn refund(&self, request: RefundRequest) -> Result<(), CheckoutError> {
        if !request.amount.is_positive() {
            return Err(CheckoutError::Validation(format!("Cannot refund {}", request.amount)));
        }
        self.gateway.refund(&request.payment_intent, request.amount).await?;
        info!("🛒️ {} refunded against {} for order #{}", request.amount, request.payment_intent, request.order_id);
        self.mark_order(GatewayAction::Refund, request.order_id, OrderStatus::Refunded).await
    }

    /// Cancels a subscription at the gateway, then marks the order as cancelled.
    pub async fn cancel_subscription(&self, request: CancelSubscriptionRequest) -> Result<(), CheckoutError> {
        self.gateway.cancel_subscription(&request.subscription_id).await?;
        info!("🛒️ Subscription {} cancelled for order #{}", request.subscription_id, request.order_id);
        self.mark_order(GatewayAction::CancelSubscription, request.order_id, OrderStatus::Cancelled).await
    }

    async fn mark_order(&self, action: GatewayAction, order_id: i64, status: OrderStatus) -> Result<(), CheckoutError> {
        self.db.update_order_status(order_id, status).await.map_err(|source| {
            error!(
                "🛒️ The {action} for order #{order_id} succeeded at the gateway, but the order could not be marked \
                 {status}. Reconcile this order by hand. {source}"
            );
            CheckoutError::StateDiverged { action, order_id, source }
        })
    }

    /// Fetches the payment intent and checks that it was paid, for the amount and currency the client claims.
    async fn confirmed_intent(
        &self,
        payment_intent: &str,
        amount: MinorUnits,
        currency: &str,
    ) -> Result<PaymentIntent, CheckoutError> {
        let intent = self.gateway.retrieve_payment_intent(payment_intent).await?;
        if intent.status != PAYMENT_SUCCEEDED {
            return Err(CheckoutError::Validation(format!(
                "Payment {payment_intent} has not completed. Its status is {}",
                intent.status
            )));
        }
        if intent.amount != amount || !intent.currency.eq_ignore_ascii_case(currency) {
            return Err(CheckoutError::PriceMismatch { expected: intent.amount, actual: amount });
        }
        Ok(intent)
    }

    async fn record(&self, charge: &ChargeDescription) -> Result<Receipt, CheckoutError> {
        charge.validate().map_err(CheckoutError::Validation)?;
        let customer_id = self.db.insert_customer(charge.customer()).await.map_err(|e| {
            warn!("🛒️ Charge {} could not be recorded. Saving the customer failed. {e}", charge.payment_intent);
            CheckoutError::CustomerStage(e)
        })?;
        let transaction_id = self.db.insert_transaction(charge.transaction()).await.map_err(|source| {
            error!(
                "🛒️ Charge {} is only partly recorded. Customer #{customer_id} was saved but the transaction was not. \
                 {source}",
                charge.payment_intent
            );
            CheckoutError::TransactionStage { customer_id, source }
        })?;
        let order_id = self.db.insert_order(charge.order(customer_id, transaction_id)).await.map_err(|source| {
            error!(
                "🛒️ Charge {} is only partly recorded. Customer #{customer_id} and transaction #{transaction_id} were \
                 saved but the order was not. {source}",
                charge.payment_intent
            );
            CheckoutError::OrderStage { customer_id, transaction_id, source }
        })?;
        let settlement = Settlement { customer_id, transaction_id, order_id };
        info!(
            "🛒️ Order #{order_id} settled: {} {} for widget #{} (customer #{customer_id}, transaction #{transaction_id})",
            charge.amount, charge.currency, charge.widget_id
        );
        let receipt = Receipt::new(charge, settlement);
        self.producers.publish_order_created(OrderCreatedEvent::new(receipt.clone())).await;
        Ok(receipt)
    }
}
