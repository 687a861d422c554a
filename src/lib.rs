//! PocketGear catalog service
//!
//! Serves the storefront's product catalog from a PostgREST-backed document
//! store, falls back to a bundled snapshot when the store cannot be read,
//! and lets signed-in users add products.
//!
//! ```no_run
//! use pocketgear::{build_router, AppConfig, AppState};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = build_router(AppState::from_config(&config)?);
//! let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use error::CatalogError;
pub use http::{build_router, AppState};
