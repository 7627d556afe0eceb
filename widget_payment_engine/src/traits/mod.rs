//! # Backend and collaborator interfaces
//!
//! This module defines the contracts the engine APIs are written against. Concrete implementations live elsewhere:
//! [`crate::SqliteDatabase`] implements the persistence traits, while the server crate supplies the payment gateway
//! and e-mail adapters.
//!
//! ## Persistence
//! * [`CheckoutManagement`] covers the writes made by the checkout settlement pipeline and the widget lookup.
//! * [`AuthManagement`] covers login tokens and password updates.
//! * [`UserManagement`] covers staff account administration.
//! * [`SalesManagement`] covers the read-only admin views of orders.
//!
//! All of these fail with [`PersistenceError`], which distinguishes timeouts and constraint violations from other
//! driver failures.
//!
//! ## External services
//! * [`PaymentGateway`] is the opaque card processor (charge, refund, subscribe).
//! * [`EmailSender`] delivers transactional e-mail.
mod auth_management;
mod checkout_management;
mod data_objects;
mod email_sender;
mod payment_gateway;
mod persistence_error;
mod sales_management;
mod user_management;

pub use auth_management::AuthManagement;
pub use checkout_management::CheckoutManagement;
pub use data_objects::{Page, SalesFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use email_sender::{EmailError, EmailSender, OutgoingEmail};
pub use payment_gateway::{
    GatewayCustomer,
    GatewayError,
    GatewaySubscription,
    PaymentGateway,
    PaymentIntent,
    PaymentMethodDetails,
};
pub use persistence_error::PersistenceError;
pub use sales_management::SalesManagement;
pub use user_management::UserManagement;
