use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Steamcord API returned status {status}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Operator-facing explanation for a non-success status.
pub fn status_message(status: u16) -> String {
    match status {
        401 => "Received an unauthorized response, check your API token.".to_string(),
        403 => "Received a forbidden response, check your subscription status.".to_string(),
        429 => "Received a rate limit response.".to_string(),
        _ => format!("Received unexpected status {status}."),
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
