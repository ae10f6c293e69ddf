//! Application error type.
//!
//! One `AppError` enum covers every failure the crate reports: request
//! validation, authentication, persistence, attachment downloads, and SMTP
//! delivery. `ResponseError` maps each variant to an HTTP status with a JSON
//! body, and `From` impls let handlers and services bubble library errors up
//! with `?`.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid credentials. HTTP 401.
    Unauthorized(String),
    /// Malformed request outside the validator's reach. HTTP 400.
    BadRequest(String),
    /// Record absent, or present but owned by someone else; the response
    /// deliberately does not distinguish the two. HTTP 404.
    NotFound(String),
    /// Unexpected server-side failure. HTTP 500.
    InternalServerError(String),
    /// Failure inside `sqlx`. HTTP 500.
    DatabaseError(String),
    /// Input rejected before any email record was created. HTTP 422.
    ValidationError(String),
    /// Attachment fetch failure. Non-fatal to an overall send: the
    /// orchestrator logs and skips the attachment. HTTP 502 if it surfaces.
    DownloadError(String),
    /// The mail transport rejected the message. `code` carries the SMTP
    /// status code when the server provided one. HTTP 502.
    TransportError {
        message: String,
        code: Option<String>,
    },
    /// The send exceeded the configured bound. Recorded the same way as a
    /// transport failure. HTTP 504.
    TimeoutError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DownloadError(msg) => write!(f, "Download Error: {}", msg),
            AppError::TransportError { message, code } => match code {
                Some(code) => write!(f, "Transport Error ({}): {}", code, message),
                None => write!(f, "Transport Error: {}", message),
            },
            AppError::TimeoutError(msg) => write!(f, "Timeout Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
            // Database detail stays server side; the client sees a plain 500.
            AppError::DatabaseError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
            AppError::ValidationError(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "error": msg
            })),
            AppError::DownloadError(msg) => HttpResponse::BadGateway().json(json!({
                "error": msg
            })),
            AppError::TransportError { message, code } => HttpResponse::BadGateway().json(json!({
                "error": message,
                "code": code
            })),
            AppError::TimeoutError(msg) => HttpResponse::GatewayTimeout().json(json!({
                "error": msg
            })),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

/// SMTP-level failures keep the server status code when one was returned.
impl From<lettre::transport::smtp::Error> for AppError {
    fn from(error: lettre::transport::smtp::Error) -> AppError {
        AppError::TransportError {
            code: error.status().map(|code| code.to_string()),
            message: error.to_string(),
        }
    }
}

/// Message-construction failures (bad headers, body encoding) happen before
/// the wire is touched but are still failures of this send attempt.
impl From<lettre::error::Error> for AppError {
    fn from(error: lettre::error::Error) -> AppError {
        AppError::TransportError {
            message: error.to_string(),
            code: None,
        }
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(error: lettre::address::AddressError) -> AppError {
        AppError::TransportError {
            message: format!("Invalid mailbox address: {}", error),
            code: None,
        }
    }
}

/// `reqwest` is only used to fetch remote attachments, so its failures are
/// attachment-level by definition.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::DownloadError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        // Test Unauthorized
        let error = AppError::Unauthorized("Invalid token".into());
        let response = error.error_response();
        assert_eq!(response.status(), 401);

        // Test BadRequest
        let error = AppError::BadRequest("Invalid input".into());
        let response = error.error_response();
        assert_eq!(response.status(), 400);

        // Test NotFound
        let error = AppError::NotFound("Resource not found".into());
        let response = error.error_response();
        assert_eq!(response.status(), 404);

        // Test ValidationError
        let error = AppError::ValidationError("Email subject is required".into());
        let response = error.error_response();
        assert_eq!(response.status(), 422);

        // Test TransportError
        let error = AppError::TransportError {
            message: "connection refused".into(),
            code: None,
        };
        let response = error.error_response();
        assert_eq!(response.status(), 502);

        // Test TimeoutError
        let error = AppError::TimeoutError("send timed out".into());
        let response = error.error_response();
        assert_eq!(response.status(), 504);
    }

    #[test]
    fn test_transport_error_display_includes_code() {
        let error = AppError::TransportError {
            message: "mailbox unavailable".into(),
            code: Some("550".into()),
        };
        assert_eq!(
            error.to_string(),
            "Transport Error (550): mailbox unavailable"
        );
    }
}
