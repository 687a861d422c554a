//! Catalog store backed by a PostgREST endpoint

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketgear_postgrest::{PostgrestClient, SortOrder};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;
use url::Url;

use crate::catalog::product::{name_key, Product, ProductRecord};
use crate::catalog::store::{CatalogStore, StoreError};
use crate::config::StoreConfig;

const PRODUCTS_TABLE: &str = "products";
const PRODUCT_COLUMNS: &str =
    "id,name,description,price,details,image,created_at,updated_at,created_by";

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: f64,
    details: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            details: row.details,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
        }
    }
}

// `name_key` is generated by the database and never sent.
#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    name: &'a str,
    description: &'a str,
    price: f64,
    details: &'a str,
    image: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: &'a str,
}

impl<'a> From<&'a ProductRecord> for InsertRow<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        InsertRow {
            name: &record.name,
            description: &record.description,
            price: record.price,
            details: &record.details,
            image: &record.image,
            created_at: record.created_at,
            updated_at: record.updated_at,
            created_by: &record.created_by,
        }
    }
}

/// An established, reachable store endpoint
#[derive(Debug)]
pub struct StoreConnection {
    http_client: Client,
    base_url: String,
    api_key: String,
    database: String,
}

impl StoreConnection {
    async fn establish(config: &StoreConfig) -> Result<Self, StoreError> {
        Url::parse(&config.url)
            .map_err(|e| StoreError::Misconfigured(format!("invalid store URL: {}", e)))?;

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Misconfigured(e.to_string()))?;

        let connection = Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.key.clone(),
            database: config.database.clone(),
        };

        connection.products()?.ping().await?;
        Ok(connection)
    }

    fn products(&self) -> Result<PostgrestClient, StoreError> {
        let client = PostgrestClient::new(
            &self.base_url,
            &self.api_key,
            PRODUCTS_TABLE,
            self.http_client.clone(),
        )
        .with_auth(&self.api_key)?
        .schema(&self.database)?;
        Ok(client)
    }
}

/// Lazily established store connection shared by every request.
///
/// The first caller connects; concurrent callers wait for that attempt and
/// everyone afterwards reuses the same connection. A failed attempt leaves
/// the handle empty, so the next caller tries again.
#[derive(Debug)]
pub struct StoreHandle {
    config: Option<StoreConfig>,
    connection: OnceCell<StoreConnection>,
}

impl StoreHandle {
    pub fn new(config: Option<StoreConfig>) -> Self {
        Self {
            config,
            connection: OnceCell::new(),
        }
    }

    pub async fn connection(&self) -> Result<&StoreConnection, StoreError> {
        self.connection
            .get_or_try_init(|| async {
                let config = self.config.as_ref().ok_or_else(|| {
                    StoreError::Misconfigured(
                        "POCKETGEAR_STORE_URL and POCKETGEAR_STORE_KEY must be set".to_string(),
                    )
                })?;
                info!(url = %config.url, database = %config.database, "Connecting to catalog store");
                let connection = StoreConnection::establish(config).await?;
                info!("Catalog store connection established");
                Ok::<_, StoreError>(connection)
            })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }
}

/// [`CatalogStore`] over the `products` table of a PostgREST endpoint
#[derive(Debug)]
pub struct RestCatalogStore {
    handle: StoreHandle,
}

impl RestCatalogStore {
    pub fn new(config: Option<StoreConfig>) -> Self {
        Self {
            handle: StoreHandle::new(config),
        }
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }
}

#[async_trait]
impl CatalogStore for RestCatalogStore {
    async fn list_newest_first(&self) -> Result<Vec<Product>, StoreError> {
        let rows = self
            .handle
            .connection()
            .await?
            .products()?
            .select(PRODUCT_COLUMNS)
            .order("created_at", SortOrder::Descending)
            .execute::<ProductRow>()
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let rows = self
            .handle
            .connection()
            .await?
            .products()?
            .select(PRODUCT_COLUMNS)
            .eq("name_key", &name_key(name))
            .limit(1)
            .execute::<ProductRow>()
            .await?;

        Ok(rows.into_iter().next().map(Product::from))
    }

    async fn insert(&self, record: &ProductRecord) -> Result<Product, StoreError> {
        let inserted = self
            .handle
            .connection()
            .await?
            .products()?
            .select(PRODUCT_COLUMNS)
            .insert(InsertRow::from(record))
            .await?;

        let rows: Vec<ProductRow> = serde_json::from_value(inserted)
            .map_err(|e| StoreError::Malformed(format!("insert response: {}", e)))?;
        rows.into_iter()
            .next()
            .map(Product::from)
            .ok_or_else(|| StoreError::Malformed("insert returned no rows".to_string()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = self
            .handle
            .connection()
            .await?
            .products()?
            .select("id")
            .count_exact()
            .await?;
        Ok(count)
    }
}
