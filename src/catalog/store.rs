//! The seam between the catalog paths and the document store

use async_trait::async_trait;
use pocketgear_postgrest::PostgrestError;
use thiserror::Error;

use crate::catalog::product::{Product, ProductRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store is not configured: {0}")]
    Misconfigured(String),

    #[error("store is unavailable: {0}")]
    Unavailable(String),

    #[error("a product with this name already exists")]
    Conflict,

    #[error("store returned malformed data: {0}")]
    Malformed(String),

    #[error("store rejected the request: {0}")]
    Rejected(String),
}

impl From<PostgrestError> for StoreError {
    fn from(err: PostgrestError) -> Self {
        if err.is_unique_violation() {
            return StoreError::Conflict;
        }
        match &err {
            PostgrestError::NetworkError(e) => StoreError::Unavailable(e.to_string()),
            PostgrestError::ApiError { status, .. }
            | PostgrestError::UnparsedApiError { status, .. }
                if status.is_server_error() =>
            {
                StoreError::Unavailable(err.to_string())
            }
            PostgrestError::ApiError { .. } | PostgrestError::UnparsedApiError { .. } => {
                StoreError::Rejected(err.to_string())
            }
            PostgrestError::SerializationError(_) | PostgrestError::DeserializationError(_) => {
                StoreError::Malformed(err.to_string())
            }
            PostgrestError::UrlParseError(_) | PostgrestError::InvalidParameters(_) => {
                StoreError::Misconfigured(err.to_string())
            }
        }
    }
}

/// Persistence operations the catalog needs
///
/// Products are never updated or deleted, so there is no such operation here.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, newest `createdAt` first
    async fn list_newest_first(&self) -> Result<Vec<Product>, StoreError>;

    /// Case-insensitive exact match on the product name
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// Insert one product; a name collision caught by the store is `Conflict`
    async fn insert(&self, record: &ProductRecord) -> Result<Product, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
