use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

/// Error body returned by the backend API, e.g. `{"detail": "..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    /// Best-effort decode; non-JSON bodies yield `None`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .filter(|err| err.detail.is_some())
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let code = ErrorCode::from_status(status);
        let message = ApiError::from_body(body)
            .and_then(|err| err.detail)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(403), ErrorCode::Forbidden);
        assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_status(429), ErrorCode::RateLimited);
        assert_eq!(ErrorCode::from_status(502), ErrorCode::Internal);
    }

    #[test]
    fn exception_prefers_backend_detail() {
        let err = ApiException::from_response(403, br#"{"detail":"You do not have permission"}"#);
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "You do not have permission");

        let err = ApiException::from_response(500, b"<html>oops</html>");
        assert_eq!(err.message, "request failed with status 500");
    }

    #[test]
    fn error_body_without_detail_is_ignored() {
        assert!(ApiError::from_body(b"{}").is_none());
        assert!(ApiError::from_body(br#"{"detail": null}"#).is_none());
        assert_eq!(
            ApiError::from_body(br#"{"detail": "Invalid token"}"#).and_then(|err| err.detail),
            Some("Invalid token".to_string())
        );

        let err = ApiException::from_response(401, br#"{"error": "nope"}"#);
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "request failed with status 401");
    }
}
