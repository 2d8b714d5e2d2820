use actix_web::{
    error::ResponseError,
    http::StatusCode,
    HttpResponse,
};
use log::*;
use settlement_engine::SettlementError;
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    /// The detail is logged where the error is raised, never sent to the caller
    #[error("An error occurred on the backend of the server. Please try again later.")]
    BackendError,
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Webhook signature is missing or invalid. {0}")]
    InvalidSignature(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The payment gateway declined the request.")]
    GatewayRejected,
    #[error("The payment gateway is unavailable. Please try again later.")]
    GatewayUnavailable,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::GatewayRejected => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(JsonResponse::failure(self))
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        use SettlementError::*;
        match e {
            OrderNotFound(_) | UserNotFound(_) | PaymentNotFound(_) | TransactionNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OrderAlreadyPaid(_) |
            OrderNotPayable { .. } |
            InvalidStatusTransition { .. } |
            PaymentInProgress(_) |
            OrderAlreadyExists(_) |
            InvalidAmount(_) |
            InsufficientBalance { .. } |
            InsufficientAvailableBalance { .. } |
            InvalidBankCode(_) |
            AccountNameMismatch |
            InvalidWebhookPayload(_) => Self::InvalidRequest(e.to_string()),
            GatewayRejected(detail) => {
                warn!("💻️ Payment gateway rejected a request. {detail}");
                Self::GatewayRejected
            },
            GatewayUnavailable(detail) => {
                error!("💻️ Payment gateway is unavailable. {detail}");
                Self::GatewayUnavailable
            },
            DatabaseError(_) | QueueError(_) | InternalError(_) => {
                error!("💻️ {e}");
                Self::BackendError
            },
        }
    }
}
