//! HTTP error responses.
//!
//! Every failure is returned as
//! ```text
//! {"error": <message>, "kind": "validation" | "numerical" | "internal"}
//! ```
//! with a status chosen by [`ApiError::status`].

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{ IntoResponse, Response },
    Json,
};
use serde::Serialize;
use tracing::{ debug, error, warn };
use crate::error::{ Error, LengthError, ValidationError };

/// Error family reported in the `kind` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Numerical,
    Internal,
}

/// An error ready to be sent back to the client.
#[derive(Clone, Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
}

impl ApiError {
    pub fn new(kind: ErrorKind, status: StatusCode, message: impl Into<String>) -> Self {
        Self { kind, status, message: message.into() }
    }

    /// Generic 500; details go to the log, not the client.
    pub fn internal() -> Self {
        Self::new(
            ErrorKind::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error during computation",
        )
    }

    pub fn status(&self) -> StatusCode { self.status }

    /// Convert an engine error, logging it on behalf of `endpoint`.
    pub fn from_engine(endpoint: &'static str, err: Error) -> Self {
        match &err {
            Error::Validation(e) => {
                debug!(endpoint, error = %e, "rejected request");
            },
            Error::Numerical(e) => {
                warn!(endpoint, error = %e, "numerical failure");
            },
            Error::Internal(e) => {
                error!(endpoint, error = %e, "internal error");
                return Self::internal();
            },
        }
        err.into()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => e.into(),
            Error::Numerical(e) => Self::new(
                ErrorKind::Numerical, StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Error::Internal(_) => Self::internal(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<LengthError> for ApiError {
    fn from(err: LengthError) -> Self { ValidationError::from(err).into() }
}

// syntax errors are 400, well-formed JSON of the wrong shape is 422, and
// buffering failures keep their own status (e.g. 413)
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorKind::Validation, rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: &self.message, kind: self.kind };
        (self.status, Json(body)).into_response()
    }
}
