//! JSON error responses.
//!
//! Handlers return [`ApiError`], which renders any [`AppError`] as
//! `{ "error": CODE, "message": ..., "field": ... }` with the matching
//! status code.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};
use validator::{ValidationErrors, ValidationErrorsKind};

use khata_core::invoice::InvoiceError;
use khata_db::{InvoiceRepositoryError, StoreError};
use khata_shared::AppError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Offending input, e.g. `items[1].quantity`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %err, "Request failed");
        } else if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
            warn!(code = err.error_code(), field = ?err.field(), error = %err, "Request rejected");
        } else {
            debug!(code = err.error_code(), "Request refused");
        }

        let body = ErrorBody {
            error: err.error_code(),
            message: err.public_message(),
            field: err.field().map(String::from),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        Self(err.into())
    }
}

impl From<InvoiceRepositoryError> for ApiError {
    fn from(err: InvoiceRepositoryError) -> Self {
        Self(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation {
            code: "INVALID_BODY",
            message: rejection.body_text(),
            field: None,
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::Validation {
            code: "INVALID_QUERY",
            message: rejection.body_text(),
            field: None,
        })
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self(AppError::Validation {
            code: "VALIDATION_ERROR",
            message: errors.to_string(),
            field: first_invalid_field(&errors),
        })
    }
}

/// Path of the alphabetically first failing field, descending into nested
/// structs and lists.
fn first_invalid_field(errors: &ValidationErrors) -> Option<String> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let (name, kind) = entries.into_iter().next()?;

    let path = match kind {
        ValidationErrorsKind::Field(_) => name.to_string(),
        ValidationErrorsKind::Struct(inner) => match first_invalid_field(inner) {
            Some(child) => format!("{name}.{child}"),
            None => name.to_string(),
        },
        ValidationErrorsKind::List(items) => match items.iter().next() {
            Some((index, inner)) => match first_invalid_field(inner) {
                Some(child) => format!("{name}[{index}].{child}"),
                None => format!("{name}[{index}]"),
            },
            None => name.to_string(),
        },
    };
    Some(path)
}
