//! API error type and its `{error}` JSON rendering

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

pub const MSG_DATABASE_UNAVAILABLE: &str = "Banco de dados indisponível";
pub const MSG_INTERNAL: &str = "Erro interno do servidor";

/// Errors reported to API clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unavailable() -> Self {
        Self::ServiceUnavailable(MSG_DATABASE_UNAVAILABLE.to_string())
    }

    /// Replace the message of an internal error, leaving client errors as they are
    pub fn with_internal_message(self, message: &str) -> Self {
        match self {
            Self::Internal(_) => Self::Internal(message.to_string()),
            other => other,
        }
    }
}

/// Store failures are logged here and reduced to a generic message for the client
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!("Store operation failed: {}", err);
        if err.is_unavailable() {
            Self::unavailable()
        } else {
            Self::Internal(MSG_INTERNAL.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
