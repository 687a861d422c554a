//! Catalog write path

use chrono::Utc;
use pocketgear_auth::Identity;
use tracing::info;

use crate::catalog::product::{NewProduct, Product, ProductSubmission};
use crate::catalog::store::CatalogStore;
use crate::error::CatalogError;

/// Add a product submitted as a JSON body.
///
/// Checks run in order and stop at the first failure: session, body shape
/// and required fields, price, field rules, name collision. Nothing touches
/// the store before the session and the body have been accepted.
pub async fn add_product(
    store: &dyn CatalogStore,
    session: Option<&Identity>,
    body: &[u8],
) -> Result<Product, CatalogError> {
    let actor = session.ok_or(CatalogError::Unauthorized)?;
    let new_product = ProductSubmission::from_json(body)?.validate()?;
    create_product(store, actor, new_product).await
}

/// Persist an already validated product for `actor`
pub async fn create_product(
    store: &dyn CatalogStore,
    actor: &Identity,
    new_product: NewProduct,
) -> Result<Product, CatalogError> {
    if store.find_by_name(&new_product.name).await?.is_some() {
        return Err(CatalogError::Conflict);
    }

    let record = new_product.stamp(actor.actor(), Utc::now());
    let product = store.insert(&record).await?;

    info!(
        id = %product.id,
        name = %product.name,
        created_by = %product.created_by,
        "Product added"
    );
    Ok(product)
}
