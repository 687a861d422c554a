use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::CatalogError;

/// The route an error surfaced on, used for the 500 and 401 wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListProducts,
    AddProduct,
    GetProduct,
    DashboardSummary,
    VerifySession,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::ListProducts => "Internal server error - Failed to fetch products",
            Operation::AddProduct => "Internal server error - Failed to add product",
            Operation::GetProduct => "Internal server error - Failed to fetch product",
            Operation::DashboardSummary => {
                "Internal server error - Failed to fetch dashboard summary"
            }
            Operation::VerifySession => "Internal server error - Failed to verify session",
        }
    }

    fn unauthorized_message(self) -> &'static str {
        match self {
            Operation::AddProduct => "Unauthorized - Please log in to add products",
            _ => "Unauthorized - Please log in",
        }
    }
}

/// Client-facing error: a status and a short `{error}` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Translate a catalog failure, logging it on the way out.
    ///
    /// Server-side details stay in the log; the body only names the
    /// operation that failed.
    pub fn from_catalog(err: CatalogError, operation: Operation) -> Self {
        if err.is_client_error() {
            warn!(?operation, error = %err, "Request rejected");
        } else {
            error!(?operation, error = %err, "Request failed");
        }

        match &err {
            CatalogError::Unauthorized => {
                Self::new(StatusCode::UNAUTHORIZED, operation.unauthorized_message())
            }
            CatalogError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            CatalogError::Conflict => Self::new(StatusCode::CONFLICT, err.to_string()),
            CatalogError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            CatalogError::Unavailable(_) | CatalogError::Internal(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                operation.failure_message(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StoreError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CatalogError::Unauthorized,
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Please log in to add products",
            ),
            (
                CatalogError::Validation(ValidationError::InvalidPrice),
                StatusCode::BAD_REQUEST,
                "Price must be a positive number",
            ),
            (
                CatalogError::Conflict,
                StatusCode::CONFLICT,
                "A product with this name already exists",
            ),
            (
                CatalogError::Unavailable(StoreError::Unavailable("refused".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error - Failed to add product",
            ),
        ];
        for (err, status, message) in cases {
            let api = ApiError::from_catalog(err, Operation::AddProduct);
            assert_eq!(api.status(), status);
            assert_eq!(api.message(), message);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let api = ApiError::from_catalog(
            CatalogError::internal("snapshot: no such file"),
            Operation::ListProducts,
        );
        assert_eq!(
            api.message(),
            "Internal server error - Failed to fetch products"
        );
    }
}
