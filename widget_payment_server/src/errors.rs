use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use thiserror::Error;
use widget_payment_engine::{AuthApiError, CheckoutError, RecoveryError, SalesApiError, UserApiError};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    /// Infrastructure failures. The detail is logged where the error is created and never sent to the client.
    #[error("An error occurred on the backend of the server. Please try again later.")]
    BackendError,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The card was declined. The gateway's message is passed on unchanged.
    #[error("{0}")]
    PaymentDeclined(String),
    #[error("The link is invalid or has expired. Please request a new one.")]
    InvalidLink,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(
        "The payment gateway accepted the {action}, but order #{order_id} could not be updated. The order must be \
         reconciled manually."
    )]
    StateDiverged { action: String, order_id: i64 },
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidLink => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StateDiverged { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        if e.is_credential_failure() {
            debug!("💻️ Authentication failed. {e}");
            Self::InvalidCredentials
        } else {
            error!("💻️ Authentication could not be completed. {e}");
            Self::BackendError
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(_) | CheckoutError::PriceMismatch { .. } => Self::ValidationError(e.to_string()),
            CheckoutError::WidgetNotFound(_) | CheckoutError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::Declined(msg) => Self::PaymentDeclined(msg),
            CheckoutError::StateDiverged { action, order_id, .. } => {
                error!("💻️ {e}");
                Self::StateDiverged { action: action.to_string(), order_id }
            },
            CheckoutError::Gateway(_)
            | CheckoutError::WidgetLookup(_)
            | CheckoutError::OrderLookup(_)
            | CheckoutError::CustomerStage(_)
            | CheckoutError::TransactionStage { .. }
            | CheckoutError::OrderStage { .. } => {
                error!("💻️ Checkout failed. {e}");
                Self::BackendError
            },
        }
    }
}

impl From<RecoveryError> for ServerError {
    fn from(e: RecoveryError) -> Self {
        if e.is_invalid_link() {
            debug!("💻️ Reset link rejected. {e}");
            return Self::InvalidLink;
        }
        match e {
            RecoveryError::UnknownEmail => Self::NoRecordFound(e.to_string()),
            RecoveryError::WeakPassword(_) => Self::ValidationError(e.to_string()),
            other => {
                error!("💻️ Account recovery failed. {other}");
                Self::BackendError
            },
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            UserApiError::Validation(msg) => Self::ValidationError(msg),
            UserApiError::EmailInUse => Self::Conflict(e.to_string()),
            other => {
                error!("💻️ Staff account operation failed. {other}");
                Self::BackendError
            },
        }
    }
}

impl From<SalesApiError> for ServerError {
    fn from(e: SalesApiError) -> Self {
        match e {
            SalesApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            SalesApiError::DatabaseError(_) => {
                error!("💻️ Sales query failed. {e}");
                Self::BackendError
            },
        }
    }
}
