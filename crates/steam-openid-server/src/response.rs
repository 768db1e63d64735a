use std::panic::Location;

use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// The standard error response returned by handlers.
#[derive(Debug)]
pub struct ErrorResponse(ErrorKind);

#[derive(Debug)]
enum ErrorKind {
    BadRequest,
    Unauthorized,
    InternalServerError,
}

impl ErrorResponse {
    pub(crate) fn bad_request() -> Self {
        Self(ErrorKind::BadRequest)
    }

    pub(crate) fn unauthorized() -> Self {
        Self(ErrorKind::Unauthorized)
    }

    #[track_caller]
    pub(crate) fn internal_server_error<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        error!(
            error = &error as &dyn std::error::Error,
            loc = %Location::caller(),
            "internal server error",
        );

        Self(ErrorKind::InternalServerError)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
