use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Paystack declined the request: {0}")]
    Declined(String),
    #[error("Paystack returned an empty data field for {0}")]
    EmptyResponse(String),
}

impl PaystackApiError {
    /// True if the failure is on Paystack's side (or the network's), rather than a problem with the request itself.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RestRequestError(_) => true,
            Self::QueryError { status, .. } => crate::is_retryable_status(*status),
            _ => false,
        }
    }
}
