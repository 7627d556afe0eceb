use log::*;
use widget_payment_engine::{
    checkout_objects::Receipt,
    events::{EventHandlers, EventHooks},
    traits::{EmailSender, OutgoingEmail},
};
use wpg_common::helpers::mask_email;

use crate::integrations::mailer::SmtpMailer;

pub const INVOICE_EVENT_BUFFER_SIZE: usize = 25;
pub const INVOICE_TEMPLATE: &str = "invoice";

/// Hooks that e-mail an invoice to the buyer once an order has been recorded.
pub fn create_invoice_event_handlers(mailer: SmtpMailer, mail_from: &str) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let mail_from = mail_from.to_string();
    hooks.on_order_created(move |ev| {
        let mailer = mailer.clone();
        let email = invoice_email(&mail_from, &ev.receipt);
        let order_id = ev.receipt.order_id;
        Box::pin(async move {
            let to = mask_email(&email.to);
            match mailer.send(email).await {
                Ok(()) => info!("📬️ Invoice for order #{order_id} sent to {to}"),
                Err(e) => error!("📬️ Could not send the invoice for order #{order_id} to {to}. {e}"),
            }
        })
    });
    EventHandlers::new(INVOICE_EVENT_BUFFER_SIZE, hooks)
}

pub fn invoice_email(from: &str, receipt: &Receipt) -> OutgoingEmail {
    let subject = format!("Your invoice for order #{}", receipt.order_id);
    OutgoingEmail::new(from, &receipt.email, &subject, INVOICE_TEMPLATE)
        .with_data("order_id", receipt.order_id.to_string())
        .with_data("first_name", receipt.first_name.as_str())
        .with_data("last_name", receipt.last_name.as_str())
        .with_data("widget_id", receipt.widget_id.to_string())
        .with_data("quantity", receipt.quantity.to_string())
        .with_data("amount", format!("{} {}", receipt.amount, receipt.currency.to_uppercase()))
        .with_data("card", format!("**** {}", receipt.last_four))
        .with_data("date", receipt.created_at.format("%Y-%m-%d").to_string())
}
