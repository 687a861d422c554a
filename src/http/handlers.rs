use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::catalog::{self, CatalogSource};
use crate::error::CatalogError;
use crate::http::error::{ApiError, Operation};
use crate::http::session::Session;
use crate::http::AppState;

pub const CATALOG_SOURCE_HEADER: &str = "x-catalog-source";

fn with_source<T: Serialize>(source: CatalogSource, status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        CATALOG_SOURCE_HEADER,
        HeaderValue::from_static(source.as_str()),
    );
    response
}

pub(crate) async fn list_products(State(state): State<AppState>) -> Result<Response, ApiError> {
    let listing = catalog::list_products(state.store.as_ref(), state.snapshot.as_ref())
        .await
        .map_err(|e| ApiError::from_catalog(e, Operation::ListProducts))?;

    Ok(with_source(listing.source, StatusCode::OK, listing.entries))
}

// The body is taken raw so the session is checked before it is parsed.
pub(crate) async fn add_product(
    State(state): State<AppState>,
    Session(session): Session,
    body: Bytes,
) -> Result<Response, ApiError> {
    let product = catalog::add_product(state.store.as_ref(), session.as_ref(), &body)
        .await
        .map_err(|e| ApiError::from_catalog(e, Operation::AddProduct))?;

    Ok(with_source(
        CatalogSource::Store,
        StatusCode::CREATED,
        json!({
            "message": "Product added successfully",
            "product": product,
        }),
    ))
}

pub(crate) async fn product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let (source, entry) =
        catalog::find_by_slug(state.store.as_ref(), state.snapshot.as_ref(), &slug)
            .await
            .map_err(|e| ApiError::from_catalog(e, Operation::GetProduct))?;

    Ok(with_source(source, StatusCode::OK, entry))
}

pub(crate) async fn dashboard_summary(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Response, ApiError> {
    if session.is_none() {
        return Err(ApiError::from_catalog(
            CatalogError::Unauthorized,
            Operation::DashboardSummary,
        ));
    }

    let listing = catalog::list_products(state.store.as_ref(), state.snapshot.as_ref())
        .await
        .map_err(|e| ApiError::from_catalog(e, Operation::DashboardSummary))?;
    let source = listing.source;

    Ok(with_source(source, StatusCode::OK, listing.summary()))
}

/// Store probe; never answered from the snapshot
pub(crate) async fn health(State(state): State<AppState>) -> Response {
    match state.store.count().await {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Database connection successful",
                "database": state.database,
                "productCount": count,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Database connection failed",
                    "error": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}
