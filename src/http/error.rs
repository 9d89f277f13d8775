//! Mapping store errors to HTTP responses.

use crate::Error;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable description.
    pub message: String,
}

/// An [`Error`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// Returns the status code for the wrapped error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            Error::ConversationNotFound(_) | Error::MessageNotFound { .. } => {
                StatusCode::NOT_FOUND
            },
            Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::OperationFailed { .. } | Error::FeatureNotEnabled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidPayload(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(Error::InvalidPayload(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::ConversationNotFound("u1".into()), StatusCode::NOT_FOUND)]
    #[test_case(
        Error::MessageNotFound { identity: "u1".into(), message_id: "m".into() },
        StatusCode::NOT_FOUND
    )]
    #[test_case(Error::InvalidPayload("role".into()), StatusCode::BAD_REQUEST)]
    #[test_case(Error::storage("put", "disk full"), StatusCode::SERVICE_UNAVAILABLE)]
    #[test_case(
        Error::OperationFailed { operation: "x".into(), cause: "y".into() },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status_mapping(err: Error, expected: StatusCode) {
        assert_eq!(ApiError(err).status(), expected);
    }
}
