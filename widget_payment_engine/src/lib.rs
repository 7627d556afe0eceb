//! Widget Payment Engine
//!
//! The core of the widget storefront's order processing. The engine is independent of any web framework and of the
//! card processor that is actually used.
//!
//! The library is divided into the following sections:
//! 1. Storage. [`traits`] defines what the engine needs from a backend, and [`SqliteDatabase`] provides it. The data
//!    types that cross that boundary live in [`db_types`].
//! 2. The public API ([`mod@wpe_api`]): checkout settlement, authentication, account recovery, staff accounts and
//!    sales reporting.
//! 3. Cryptographic helpers ([`helpers`]) for tokens, passwords, signed links and encrypted link parameters.
//! 4. Events ([`events`]). Hooks fire when orders are created, and the admin notification hub fans events out to
//!    every connected admin client.
//!
//! The card processor and the mail transport are supplied by the caller through the [`traits::PaymentGateway`] and
//! [`traits::EmailSender`] traits.
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
pub mod wpe_api;

#[cfg(feature = "sqlite")]
pub use sqlite::{db::SQLITE_DB_URL, SqliteDatabase};
pub use wpe_api::{
    auth_api::AuthApi,
    checkout_api::CheckoutApi,
    checkout_objects,
    errors::{AuthApiError, CheckoutError, RecoveryError, SalesApiError, SettlementStage, UserApiError},
    recovery_api::{AccountRecoveryApi, RecoverySettings},
    sales_api::SalesApi,
    user_api::UserApi,
    user_objects,
};
