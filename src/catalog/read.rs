//! Catalog read path: store first, snapshot when the store fails

use serde::Serialize;
use tracing::{error, warn};

use crate::catalog::product::{slugify, Product};
use crate::catalog::snapshot::{SnapshotProduct, SnapshotSource};
use crate::catalog::store::CatalogStore;
use crate::error::CatalogError;

/// Number of entries in the dashboard's recent list
pub const RECENT_PRODUCTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Store,
    Snapshot,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::Store => "store",
            CatalogSource::Snapshot => "snapshot",
        }
    }
}

/// One listed product, from whichever source answered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Stored(Product),
    Snapshot(SnapshotProduct),
}

impl CatalogEntry {
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Stored(product) => &product.name,
            CatalogEntry::Snapshot(product) => &product.name,
        }
    }

    pub fn slug(&self) -> String {
        slugify(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub source: CatalogSource,
    pub entries: Vec<CatalogEntry>,
}

impl Listing {
    fn from_store(products: Vec<Product>) -> Self {
        Self {
            source: CatalogSource::Store,
            entries: products.into_iter().map(CatalogEntry::Stored).collect(),
        }
    }

    fn from_snapshot(products: Vec<SnapshotProduct>) -> Self {
        Self {
            source: CatalogSource::Snapshot,
            entries: products.into_iter().map(CatalogEntry::Snapshot).collect(),
        }
    }

    pub fn find_by_slug(self, slug: &str) -> Option<CatalogEntry> {
        self.entries.into_iter().find(|entry| entry.slug() == slug)
    }

    pub fn summary(self) -> CatalogSummary {
        let total_products = self.entries.len();
        let recent_products = self.entries.into_iter().take(RECENT_PRODUCTS).collect();
        CatalogSummary {
            total_products,
            recent_products,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub total_products: usize,
    pub recent_products: Vec<CatalogEntry>,
}

/// List every product, newest first.
///
/// Any store failure switches to the snapshot once, without retrying the
/// store. Only a failing snapshot makes the whole read fail.
pub async fn list_products(
    store: &dyn CatalogStore,
    snapshot: &dyn SnapshotSource,
) -> Result<Listing, CatalogError> {
    let store_err = match store.list_newest_first().await {
        Ok(products) => return Ok(Listing::from_store(products)),
        Err(err) => err,
    };
    error!(error = %store_err, "Error fetching products from store");

    match snapshot.load().await {
        Ok(products) => {
            warn!(
                count = products.len(),
                "Falling back to static snapshot due to store error"
            );
            Ok(Listing::from_snapshot(products))
        }
        Err(snapshot_err) => {
            error!(error = %snapshot_err, "Fallback to static snapshot also failed");
            Err(CatalogError::internal(format!(
                "store: {}; snapshot: {}",
                store_err, snapshot_err
            )))
        }
    }
}

/// Look a product up by the slug of its name, over [`list_products`]
pub async fn find_by_slug(
    store: &dyn CatalogStore,
    snapshot: &dyn SnapshotSource,
    slug: &str,
) -> Result<(CatalogSource, CatalogEntry), CatalogError> {
    let listing = list_products(store, snapshot).await?;
    let source = listing.source;
    listing
        .find_by_slug(slug)
        .map(|entry| (source, entry))
        .ok_or(CatalogError::NotFound)
}
