//! HTTP surface of the catalog
//!
//! | route | |
//! | --- | --- |
//! | `GET /api/products` | every product, newest first |
//! | `POST /api/products` | add a product (session required) |
//! | `GET /api/products/:slug` | one product by the slug of its name |
//! | `GET /api/dashboard/summary` | count and most recent products (session required) |
//! | `GET /api/health` | store reachability and product count |

mod error;
mod handlers;
mod session;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use pocketgear_auth::{JwtVerifier, RemoteVerifier, SessionVerifier};
use tracing::{info, warn};

use crate::catalog::{CatalogStore, FileSnapshot, RestCatalogStore, SnapshotSource};
use crate::config::{AppConfig, ConfigError};

pub use error::{ApiError, Operation};
pub use handlers::CATALOG_SOURCE_HEADER;
pub use session::Session;

/// Dependencies shared by every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub snapshot: Arc<dyn SnapshotSource>,
    /// `None` means every request is unauthenticated
    pub sessions: Option<Arc<dyn SessionVerifier>>,
    /// Named database reported by the health probe
    pub database: String,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, snapshot: Arc<dyn SnapshotSource>) -> Self {
        Self {
            store,
            snapshot,
            sessions: None,
            database: AppConfig::default().database,
        }
    }

    pub fn with_sessions(mut self, verifier: Arc<dyn SessionVerifier>) -> Self {
        self.sessions = Some(verifier);
        self
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Wire the production dependencies.
    ///
    /// The store is not contacted here; the first request establishes the
    /// connection.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let store = RestCatalogStore::new(config.store_config());
        if config.store_config().is_none() {
            warn!("Catalog store is not configured; reads will be served from the snapshot");
        }
        let snapshot = FileSnapshot::new(config.snapshot_path.clone());
        info!(path = %snapshot.path().display(), "Using fallback snapshot");

        let state = Self::new(Arc::new(store), Arc::new(snapshot)).with_database(&config.database);
        match session_verifier(config)? {
            Some(verifier) => Ok(state.with_sessions(verifier)),
            None => {
                warn!("No session verifier configured; every request is unauthenticated");
                Ok(state)
            }
        }
    }
}

fn session_verifier(config: &AppConfig) -> Result<Option<Arc<dyn SessionVerifier>>, ConfigError> {
    if let Some(secret) = config.jwt_secret.as_deref() {
        let mut verifier = JwtVerifier::new(secret);
        if let Some(audience) = config.jwt_audience.as_deref() {
            verifier = verifier.with_audience(audience);
        }
        info!("Verifying session tokens locally");
        return Ok(Some(Arc::new(verifier)));
    }

    let Some(url) = config.auth_url.as_deref() else {
        return Ok(None);
    };
    let key = config
        .auth_key
        .as_deref()
        .or(config.store_key.as_deref())
        .unwrap_or_default();
    let http_client = reqwest::Client::builder()
        .timeout(config.store_timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
    info!(auth_url = %url, "Verifying session tokens with the auth server");
    Ok(Some(Arc::new(RemoteVerifier::new(url, key, http_client))))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::add_product),
        )
        .route("/api/products/:slug", get(handlers::product_by_slug))
        .route("/api/dashboard/summary", get(handlers::dashboard_summary))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
