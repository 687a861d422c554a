//! Product catalog access layer
//!
//! - [`store`]: the persistence seam, with a PostgREST ([`rest`]) and an
//!   in-memory ([`memory`]) implementation
//! - [`read`]: listing with the snapshot fallback
//! - [`write`]: validation and insertion of new products

pub mod memory;
pub mod product;
pub mod read;
pub mod rest;
pub mod snapshot;
pub mod store;
pub mod write;

pub use memory::MemoryCatalogStore;
pub use product::{NewProduct, PriceInput, Product, ProductRecord, ProductSubmission, ValidationError};
pub use read::{find_by_slug, list_products, CatalogEntry, CatalogSource, CatalogSummary, Listing};
pub use rest::{RestCatalogStore, StoreHandle};
pub use snapshot::{FileSnapshot, SnapshotError, SnapshotProduct, SnapshotSource};
pub use store::{CatalogStore, StoreError};
pub use write::{add_product, create_product};
