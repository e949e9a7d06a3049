//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the rosterd
//! API. It maps domain-specific errors to appropriate HTTP status codes and
//! JSON error responses, ensuring a consistent error handling experience
//! across the entire API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rosterd_core::errors::RosterError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps domain-specific `RosterError` instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub RosterError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            RosterError::NotFound(_) => StatusCode::NOT_FOUND,
            RosterError::Validation(_) => StatusCode::BAD_REQUEST,
            RosterError::Authorization(_) => StatusCode::FORBIDDEN,
            RosterError::Conflict(_) => StatusCode::CONFLICT,
            RosterError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RosterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}

/// Allows using `?` with functions returning `Result<T, RosterError>` in
/// handlers that return `Result<T, AppError>`.
impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        AppError(err)
    }
}

/// Allows using `?` with functions returning `Result<T, eyre::Report>` in
/// handlers that return `Result<T, AppError>`. The eyre error is wrapped in
/// a `RosterError::Database` variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(RosterError::Database(err))
    }
}

/// Maps a RosterError directly to an HTTP response.
pub fn map_error(err: RosterError) -> Response {
    AppError(err).into_response()
}
