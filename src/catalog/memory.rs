//! In-process catalog store

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::product::{name_key, Product, ProductRecord};
use crate::catalog::store::{CatalogStore, StoreError};

/// [`CatalogStore`] kept in memory, with the same case-insensitive name
/// uniqueness the database index provides
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_newest_first(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        // Later insertions win ties on equal timestamps.
        let mut listed: Vec<Product> = products.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let key = name_key(name);
        let products = self.products.read().await;
        Ok(products.iter().find(|p| name_key(&p.name) == key).cloned())
    }

    async fn insert(&self, record: &ProductRecord) -> Result<Product, StoreError> {
        let key = name_key(&record.name);
        let mut products = self.products.write().await;
        if products.iter().any(|p| name_key(&p.name) == key) {
            return Err(StoreError::Conflict);
        }
        let product = record.clone().with_id(Uuid::new_v4().to_string());
        products.push(product.clone());
        Ok(product)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.products.read().await.len() as u64)
    }
}
