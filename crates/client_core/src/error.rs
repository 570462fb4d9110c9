use checklist::ValidationError;
use shared::{
    domain::MachineTypeId,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("{endpoint} answered with status {status}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("no checklist is configured for machine type {0}")]
    NoChecklist(MachineTypeId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("local storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Unauthorized(_) => ErrorCode::Unauthorized,
            ClientError::Upstream { status: 404, .. } | ClientError::NoChecklist(_) => {
                ErrorCode::NotFound
            }
            ClientError::Upstream { .. }
            | ClientError::Transport { .. }
            | ClientError::Decode { .. } => ErrorCode::Upstream,
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::InvalidUrl(_) | ClientError::Storage(_) => ErrorCode::Internal,
        }
    }

    /// Text safe to show to the person using the app. Upstream details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized(_) => "your session is not valid, sign in again".to_string(),
            ClientError::Upstream { status: 404, .. } => "the requested record was not found".to_string(),
            ClientError::Upstream { .. } | ClientError::Transport { .. } | ClientError::Decode { .. } => {
                "the inspection service could not complete the request, try again".to_string()
            }
            ClientError::NoChecklist(_) | ClientError::Validation(_) => self.to_string(),
            ClientError::InvalidUrl(_) | ClientError::Storage(_) => {
                "an unexpected error occurred".to_string()
            }
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.code(), self.user_message())
    }
}
