//! Error handling for the social graph API
//!
//! [`ApiError`] is the single error type surfaced to clients. HTTP handlers
//! return it through Axum's `IntoResponse`; GraphQL resolvers convert it with
//! `ErrorExtensions` so every field error carries `extensions.code`.

use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::graphql::loaders::LoadError;
use crate::store::StoreError;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Resource Errors ==========
    /// Requested resource not found
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Write rejected by a uniqueness rule
    #[error("{resource_type} already exists: {detail}")]
    Conflict {
        resource_type: &'static str,
        detail: String,
    },

    /// Write references a row that does not exist
    #[error("{resource_type} references a missing row: {detail}")]
    InvalidReference {
        resource_type: &'static str,
        detail: String,
    },

    // ========== Store Errors ==========
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A batched lookup failed for reasons other than the store's
    #[error("loader error: {0}")]
    Loader(LoadError),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Loader(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidReference { .. } => "INVALID_REFERENCE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Loader(_) => "LOADER_ERROR",
        }
    }

    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Message safe to show a client; server-side details stay in the logs
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Loader(_) => UNEXPECTED_ERROR.to_string(),
            _ => self.to_string(),
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let error_response = ErrorResponse {
            code: self.error_code(),
            message: self.client_message(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        self.log();

        async_graphql::Error::new(self.client_message())
            .extend_with(|_, e| e.set("code", self.error_code()))
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

// ========== Conversion Implementations ==========

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound {
                resource_type: entity,
                id,
            },
            StoreError::Conflict { entity, detail } => Self::Conflict {
                resource_type: entity,
                detail,
            },
            StoreError::InvalidReference { entity, detail } => Self::InvalidReference {
                resource_type: entity,
                detail,
            },
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            StoreError::Database(err) => Self::Database(err),
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        // Batch errors are shared between keys, so the store error is
        // only borrowed here.
        if let LoadError::Store(store_err) = &err {
            return match store_err.as_ref() {
                StoreError::NotFound { entity, id } => Self::not_found(*entity, id),
                StoreError::Unavailable(reason) => Self::StoreUnavailable(reason.clone()),
                _ => Self::Loader(err),
            };
        }
        Self::Loader(err)
    }
}
