//! Error types for the registry API
//!
//! Every failure is terminal for its request and rendered as a JSON body.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::repository::RepositoryError;

/// FieldErrors
///
/// Field-level validation failures, keyed by field name. Serializes as
/// `{"name": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, empty if the field is valid.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ok when no field failed, otherwise a validation error carrying every failure.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

// == Api Error Enum ==
/// Unified error type for handlers, extractors and middleware.
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more fields violated their constraints
    #[error("Invalid input: {0:?}")]
    Validation(FieldErrors),

    /// Request body is not valid JSON for the expected shape
    #[error("JSON parse error - {0}")]
    MalformedBody(String),

    /// Request body was not sent as `application/json`
    #[error("Unsupported media type")]
    UnsupportedMediaType,

    /// Mutating request without valid credentials
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// Identifier does not resolve, possibly within a parent scope
    #[error("Not found.")]
    NotFound,

    /// Storage or other unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::MalformedBody(_) => detail(StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::UnsupportedMediaType => detail(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`.",
            ),
            ApiError::NotAuthenticated => {
                let mut response = detail(StatusCode::UNAUTHORIZED, self.to_string());
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    header::HeaderValue::from_static("Bearer"),
                );
                response
            }
            ApiError::NotFound => detail(StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(cause) => {
                tracing::error!("internal error: {}", cause);
                detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
        }
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType,
            other => ApiError::MalformedBody(other.body_text()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UnknownUniversity(id) => {
                let mut errors = FieldErrors::new();
                errors.add("university", invalid_pk(id));
                ApiError::Validation(errors)
            }
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Message for a reference that does not resolve to a stored record.
pub fn invalid_pk(id: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Message for a reference of a JSON type that cannot name a primary key.
pub fn incorrect_pk_type(type_name: &str) -> String {
    format!("Incorrect type. Expected pk value, received {}.", type_name)
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
