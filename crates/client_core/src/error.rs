use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}: {source}")]
    Status {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("url '{0}' cannot carry path segments")]
    CannotBeABase(String),
}

impl TransportError {
    pub fn status(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            source: ApiException::from_response(status, body),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Status { source, .. } => Some(source.code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to fetch processing issues: {0}")]
    FetchFailed(#[source] TransportError),
    #[error("failed to trigger reprocessing: {0}")]
    ReprocessFailed(#[source] TransportError),
    #[error("there are no pending events to reprocess")]
    NothingToReprocess,
    #[error("reprocessing is already in progress")]
    AlreadyReprocessing,
    #[error("processing issues view has been torn down")]
    Closed,
}
