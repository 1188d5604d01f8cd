use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Paystack could not be reached: {0}")]
    Unreachable(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Paystack declined the request: {0}")]
    Declined(String),
}

impl PaystackApiError {
    /// Whether the same request could reasonably succeed if sent again later. Timeouts, connection failures, rate
    /// limiting and server-side errors qualify. Anything Paystack rejected on its merits does not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status == 429 || *status >= 500,
            Self::Initialization(_) | Self::RestRequestError(_) | Self::JsonError(_) | Self::Declined(_) => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::PaystackApiError;

    #[test]
    fn retryable_errors() {
        assert!(PaystackApiError::Unreachable("timed out".into()).is_retryable());
        assert!(PaystackApiError::QueryError { status: 503, message: "".into() }.is_retryable());
        assert!(PaystackApiError::QueryError { status: 429, message: "".into() }.is_retryable());
        assert!(!PaystackApiError::QueryError { status: 400, message: "Invalid key".into() }.is_retryable());
        assert!(!PaystackApiError::Declined("Duplicate Transaction Reference".into()).is_retryable());
    }
}
