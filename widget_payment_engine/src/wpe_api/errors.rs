use chrono::{DateTime, Utc};
use thiserror::Error;
use wpg_common::MinorUnits;

use crate::{
    helpers::CryptoError,
    traits::{EmailError, GatewayError, PersistenceError},
    wpe_api::checkout_objects::GatewayAction,
};

/// Reasons an authentication attempt fails.
///
/// These are kept distinct for logging. Anything facing a client should collapse every credential failure into one
/// generic response, see [`AuthApiError::is_credential_failure`].
#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("The authorization header is not of the form 'Bearer <token>'")]
    MalformedHeader,
    #[error("Bearer tokens are 26 characters long, but this one has {0}")]
    InvalidTokenLength(usize),
    #[error("No token matches the one presented")]
    TokenNotFound,
    #[error("The token expired at {0}")]
    TokenExpired(DateTime<Utc>),
    #[error("No user has that e-mail address")]
    UserNotFound,
    #[error("The password does not match")]
    InvalidPassword,
    #[error("Database error: {0}")]
    DatabaseError(#[from] PersistenceError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

impl AuthApiError {
    /// True for failures caused by the credentials the caller presented, as opposed to a backend fault.
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, AuthApiError::DatabaseError(_) | AuthApiError::CryptoError(_))
    }
}

/// Which stage of the settlement pipeline an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStage {
    Customer,
    Transaction,
    Order,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request. {0}")]
    Validation(String),
    #[error("Widget {0} does not exist")]
    WidgetNotFound(i64),
    #[error("Could not look up the widget. {0}")]
    WidgetLookup(PersistenceError),
    #[error("The amount charged ({actual}) does not match the price of the order ({expected})")]
    PriceMismatch { expected: MinorUnits, actual: MinorUnits },
    /// The card was declined. The message comes from the gateway and is meant for the buyer.
    #[error("{0}")]
    Declined(String),
    #[error("Payment gateway error. {0}")]
    Gateway(GatewayError),
    #[error("Could not save the customer. {0}")]
    CustomerStage(PersistenceError),
    #[error("Could not save the transaction for customer #{customer_id}. {source}")]
    TransactionStage { customer_id: i64, source: PersistenceError },
    #[error(
        "Could not save the order for customer #{customer_id} and transaction #{transaction_id}. {source}"
    )]
    OrderStage { customer_id: i64, transaction_id: i64, source: PersistenceError },
    #[error("The {action} went through at the gateway but order #{order_id} could not be updated. {source}")]
    StateDiverged { action: GatewayAction, order_id: i64, source: PersistenceError },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Could not look up the order. {0}")]
    OrderLookup(PersistenceError),
}

impl CheckoutError {
    /// The settlement stage that failed, if this error came from the settlement pipeline.
    pub fn stage(&self) -> Option<SettlementStage> {
        match self {
            CheckoutError::CustomerStage(_) => Some(SettlementStage::Customer),
            CheckoutError::TransactionStage { .. } => Some(SettlementStage::Transaction),
            CheckoutError::OrderStage { .. } => Some(SettlementStage::Order),
            _ => None,
        }
    }
}

impl From<GatewayError> for CheckoutError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Declined(msg) => CheckoutError::Declined(msg),
            e @ GatewayError::InvalidId(_) => CheckoutError::Validation(e.to_string()),
            other => CheckoutError::Gateway(other),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RecoveryError {
    #[error("No account uses that e-mail address")]
    UnknownEmail,
    #[error("The reset link has been tampered with")]
    LinkTampered,
    #[error("The reset link has expired")]
    LinkExpired,
    #[error("The reset link is malformed. {0}")]
    MalformedLink(String),
    #[error("The e-mail address in the reset link could not be decrypted. {0}")]
    EmailDecryption(CryptoError),
    #[error("Could not create a reset link. {0}")]
    LinkCreation(CryptoError),
    #[error("The new password is too weak. {0}")]
    WeakPassword(String),
    #[error("Could not hash the new password. {0}")]
    PasswordHash(CryptoError),
    #[error("Could not send the reset e-mail. {0}")]
    Email(#[from] EmailError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] PersistenceError),
}

impl RecoveryError {
    /// True when the link itself is at fault, so the client should request a new one.
    pub fn is_invalid_link(&self) -> bool {
        matches!(
            self,
            RecoveryError::LinkTampered
                | RecoveryError::LinkExpired
                | RecoveryError::MalformedLink(_)
                | RecoveryError::EmailDecryption(_)
        )
    }
}

impl From<CryptoError> for RecoveryError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::LinkExpired => RecoveryError::LinkExpired,
            CryptoError::InvalidSignature | CryptoError::MissingSignature => RecoveryError::LinkTampered,
            CryptoError::MalformedLink(s) => RecoveryError::MalformedLink(s),
            other => RecoveryError::EmailDecryption(other),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("User {0} does not exist")]
    NotFound(i64),
    #[error("Invalid user details. {0}")]
    Validation(String),
    #[error("That e-mail address is already in use")]
    EmailInUse,
    #[error("Could not hash the password. {0}")]
    PasswordHash(#[from] CryptoError),
    #[error("Database error: {0}")]
    DatabaseError(PersistenceError),
}

impl From<PersistenceError> for UserApiError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::ConstraintViolation(_) => UserApiError::EmailInUse,
            other => UserApiError::DatabaseError(other),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SalesApiError {
    #[error("Order {0} does not exist")]
    NotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(#[from] PersistenceError),
}
