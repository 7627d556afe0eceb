//! Adapters for the outside services the engine depends on: the card processor, the SMTP relay, and the hooks that
//! tie order events to outgoing mail.
pub mod invoice;
pub mod mailer;
pub mod stripe;
