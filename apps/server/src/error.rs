use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use tracing::error;
use watchtower::{StoreError, TargetError, config::ConfigError};

use crate::response::ApiResponse;

/// Startup failures of the server binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A failed API call, rendered as an error envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Map a management failure, using `internal` as the message for store
    /// errors so backend details stay in the logs.
    pub fn from_target(e: TargetError, internal: &'static str) -> Self {
        match e {
            TargetError::InvalidUrl(reason) => Self::BadRequest(reason),
            TargetError::AlreadyExists | TargetError::Contended => Self::Conflict(e.to_string()),
            TargetError::NotFound => Self::NotFound(e.to_string()),
            TargetError::Store(source) => {
                error!("{}: {}", internal, source);
                Self::Internal(internal)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(self.to_string()))
    }
}
