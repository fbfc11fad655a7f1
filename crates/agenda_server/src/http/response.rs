//! Response envelope and error-to-status mapping.
//!
//! # Invariants
//! - `InvalidInput` and malformed requests map to 400 with their own text.
//! - `NotFound` maps to 404 with `contact not found for id X`.
//! - Anything else maps to 500 with a generic message; detail is logged only.

use agenda_core::ContactServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const UNEXPECTED_ERROR_MESSAGE: &str = "unexpected error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// `{status, message, data}` wrapper for mutating endpoints and all errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
            data: None,
        }
    }
}

/// Failure of one HTTP request.
#[derive(Debug)]
pub enum ApiError {
    Service(ContactServiceError),
    /// Body or path could not be decoded.
    Malformed(String),
    /// Host-side failure outside the service (lock poisoning, task join).
    Internal(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Malformed(message) => write!(f, "malformed request: {message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ContactServiceError> for ApiError {
    fn from(value: ContactServiceError) -> Self {
        Self::Service(value)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ContactServiceError::InvalidInput(_)) | Self::Malformed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(ContactServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ContactServiceError::ConflictOrUnexpected(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Service(ContactServiceError::ConflictOrUnexpected(_)) | Self::Internal(_) => {
                UNEXPECTED_ERROR_MESSAGE.to_string()
            }
            Self::Service(err) => err.to_string(),
            Self::Malformed(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                "event=http_error module=http status={} error={}",
                status.as_u16(),
                self
            );
        }
        (status, Json(Envelope::<()>::error(self.public_message()))).into_response()
    }
}
