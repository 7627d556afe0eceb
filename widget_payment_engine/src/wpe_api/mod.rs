//! # Widget payment engine public API
//!
//! Each API is a thin struct over one or more backend traits, so callers can pick only what they need and swap in
//! any backend (or a mock) that implements the relevant traits.
//!
//! * [`checkout_api`] turns confirmed card payments into customer, transaction and order records, and handles refunds
//!   and subscription cancellations.
//! * [`auth_api`] handles staff login and bearer-token authentication.
//! * [`recovery_api`] e-mails signed password-reset links and applies them.
//! * [`user_api`] administers staff accounts.
//! * [`sales_api`] pages through completed sales and subscriptions.
//!
//! ```rust,ignore
//! use widget_payment_engine::{SalesApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/widget_store.db", 5).await?;
//! let api = SalesApi::new(db);
//! let first_page = api.all_sales(10, 1).await?;
//! ```
pub mod auth_api;
pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod recovery_api;
pub mod sales_api;
pub mod user_api;
pub mod user_objects;

#[cfg(test)]
pub(crate) mod test_mocks;
