//! Error handling for the catalog paths

use thiserror::Error;

use crate::catalog::product::ValidationError;
use crate::catalog::store::StoreError;

/// Failure of a catalog operation, as the HTTP layer sees it
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No established session
    #[error("Unauthorized - Please log in to add products")]
    Unauthorized,

    /// Missing or malformed input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A product with the same name (ignoring case) exists
    #[error("A product with this name already exists")]
    Conflict,

    #[error("Product not found")]
    NotFound,

    /// The store could not be reached or is not configured
    #[error("store unavailable: {0}")]
    Unavailable(#[source] StoreError),

    /// Anything else, including a broken fallback snapshot
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => CatalogError::Conflict,
            StoreError::Misconfigured(_) | StoreError::Unavailable(_) => {
                CatalogError::Unavailable(err)
            }
            StoreError::Malformed(_) | StoreError::Rejected(_) => {
                CatalogError::Internal(err.to_string())
            }
        }
    }
}

impl CatalogError {
    pub fn internal<T: std::fmt::Display>(msg: T) -> Self {
        CatalogError::Internal(msg.to_string())
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Unauthorized
                | CatalogError::Validation(_)
                | CatalogError::Conflict
                | CatalogError::NotFound
        )
    }
}
