use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pocketgear::catalog::{
    add_product, find_by_slug, list_products, CatalogEntry, CatalogSource, CatalogStore,
    FileSnapshot, MemoryCatalogStore, Product, ProductRecord, StoreError, ValidationError,
};
use pocketgear::CatalogError;
use pocketgear_auth::Identity;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

/// Store whose every call fails, counting how often it was asked
#[derive(Default)]
struct UnreachableStore {
    calls: AtomicUsize,
}

impl UnreachableStore {
    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl CatalogStore for UnreachableStore {
    async fn list_newest_first(&self) -> Result<Vec<Product>, StoreError> {
        Err(self.fail())
    }
    async fn find_by_name(&self, _name: &str) -> Result<Option<Product>, StoreError> {
        Err(self.fail())
    }
    async fn insert(&self, _record: &ProductRecord) -> Result<Product, StoreError> {
        Err(self.fail())
    }
    async fn count(&self) -> Result<u64, StoreError> {
        Err(self.fail())
    }
}

fn snapshot_doc() -> Value {
    json!([
        {
            "id": 1,
            "name": "MagSafe Charger",
            "description": "Snap-on wireless charging",
            "price": 39,
            "details": "15W, USB-C cable, magnetic",
            "image": "/images/magsafe.jpg",
            "features": ["fast", "slim"]
        },
        {
            "id": 2,
            "name": "Wireless Earbuds",
            "description": "Noise cancelling earbuds",
            "price": 89.5,
            "details": "ANC, 24h battery, USB-C case",
            "image": "/images/earbuds.jpg"
        }
    ])
}

fn snapshot_file(doc: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(doc.to_string().as_bytes()).unwrap();
    file
}

fn hub_body() -> Vec<u8> {
    json!({
        "name": "USB-C Hub",
        "description": "A compact multiport hub",
        "price": 29.99,
        "details": "4 ports, USB-C, aluminum",
        "image": "https://example.com/hub.jpg"
    })
    .to_string()
    .into_bytes()
}

fn user() -> Identity {
    Identity::new("user-1", Some("user@example.com".to_string()))
}

fn stored(name: &str, age_minutes: i64) -> Product {
    let at = Utc::now() - Duration::minutes(age_minutes);
    Product {
        id: format!("id-{}", age_minutes),
        name: name.to_string(),
        description: "Seeded product description".to_string(),
        price: 10.0,
        details: "seeded, details, here".to_string(),
        image: "https://example.com/seed.jpg".to_string(),
        created_at: at,
        updated_at: at,
        created_by: "seed@example.com".to_string(),
    }
}

#[tokio::test]
async fn test_added_product_is_listed_first() {
    let store = MemoryCatalogStore::with_products(vec![
        stored("Old Cable", 60),
        stored("Older Stand", 120),
    ]);
    let snapshot = FileSnapshot::new("/unused/data.json");

    let product = add_product(&store, Some(&user()), &hub_body()).await.unwrap();
    assert_eq!(product.name, "USB-C Hub");
    assert_eq!(product.price, 29.99);
    assert_eq!(product.created_by, "user@example.com");
    assert_eq!(product.created_at, product.updated_at);
    assert!(!product.id.is_empty());

    let listing = list_products(&store, &snapshot).await.unwrap();
    assert_eq!(listing.source, CatalogSource::Store);
    let names: Vec<&str> = listing.entries.iter().map(CatalogEntry::name).collect();
    assert_eq!(names, vec!["USB-C Hub", "Old Cable", "Older Stand"]);
}

#[tokio::test]
async fn test_name_conflict_ignores_case() {
    let store = MemoryCatalogStore::new();
    add_product(&store, Some(&user()), &hub_body()).await.unwrap();

    let mut body: Value = serde_json::from_slice(&hub_body()).unwrap();
    body["name"] = json!("usb-c hub");
    let err = add_product(&store, Some(&user()), body.to_string().as_bytes())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Conflict));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unauthenticated_add_inserts_nothing() {
    let store = MemoryCatalogStore::new();

    for body in [hub_body(), b"not json".to_vec(), Vec::new()] {
        let err = add_product(&store, None, &body).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized));
    }
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_submissions_touch_no_store() {
    let store = UnreachableStore::default();

    let missing = add_product(&store, Some(&user()), br#"{"name": "Hub"}"#)
        .await
        .unwrap_err();
    assert!(matches!(
        missing,
        CatalogError::Validation(ValidationError::MissingFields(_))
    ));

    let mut body: Value = serde_json::from_slice(&hub_body()).unwrap();
    body["price"] = json!(-5);
    let bad_price = add_product(&store, Some(&user()), body.to_string().as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(
        bad_price,
        CatalogError::Validation(ValidationError::InvalidPrice)
    ));

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_actor_without_email_is_unknown() {
    let store = MemoryCatalogStore::new();
    let anonymous = Identity::new("user-2", None);

    let product = add_product(&store, Some(&anonymous), &hub_body()).await.unwrap();
    assert_eq!(product.created_by, "unknown");
}

#[tokio::test]
async fn test_add_with_unreachable_store_is_unavailable() {
    let store = UnreachableStore::default();
    let err = add_product(&store, Some(&user()), &hub_body()).await.unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(_)));
}

#[tokio::test]
async fn test_empty_store_lists_nothing() {
    let store = MemoryCatalogStore::new();
    let file = snapshot_file(&snapshot_doc());

    let listing = list_products(&store, &FileSnapshot::new(file.path())).await.unwrap();
    assert_eq!(listing.source, CatalogSource::Store);
    assert!(listing.entries.is_empty());
}

#[tokio::test]
async fn test_fallback_returns_snapshot_verbatim() {
    let store = UnreachableStore::default();
    let doc = snapshot_doc();
    let file = snapshot_file(&doc);

    let listing = list_products(&store, &FileSnapshot::new(file.path())).await.unwrap();

    assert_eq!(listing.source, CatalogSource::Snapshot);
    assert_eq!(serde_json::to_value(&listing.entries).unwrap(), doc);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_both_sources_failing_is_internal() {
    let store = UnreachableStore::default();
    let mut corrupt = NamedTempFile::new().unwrap();
    corrupt.write_all(b"{ not json").unwrap();

    for snapshot in [
        FileSnapshot::new(corrupt.path()),
        FileSnapshot::new("/definitely/not/here/data.json"),
    ] {
        let err = list_products(&store, &snapshot).await.unwrap_err();
        assert!(matches!(err, CatalogError::Internal(_)));
    }
}

#[tokio::test]
async fn test_find_by_slug_in_store_and_snapshot() {
    let store = MemoryCatalogStore::with_products(vec![stored("Wireless   Charging Pad", 5)]);
    let snapshot = FileSnapshot::new("/unused/data.json");

    let (source, entry) = find_by_slug(&store, &snapshot, "wireless-charging-pad")
        .await
        .unwrap();
    assert_eq!(source, CatalogSource::Store);
    assert_eq!(entry.name(), "Wireless   Charging Pad");

    assert!(matches!(
        find_by_slug(&store, &snapshot, "nope").await,
        Err(CatalogError::NotFound)
    ));

    let file = snapshot_file(&snapshot_doc());
    let (source, entry) = find_by_slug(
        &UnreachableStore::default(),
        &FileSnapshot::new(file.path()),
        "magsafe-charger",
    )
    .await
    .unwrap();
    assert_eq!(source, CatalogSource::Snapshot);
    assert_eq!(serde_json::to_value(&entry).unwrap(), snapshot_doc()[0]);
}

#[tokio::test]
async fn test_summary_takes_three_newest() {
    let store = MemoryCatalogStore::with_products(vec![
        stored("Fourth", 40),
        stored("First", 10),
        stored("Third", 30),
        stored("Second", 20),
    ]);
    let snapshot = FileSnapshot::new("/unused/data.json");

    let summary = list_products(&store, &snapshot).await.unwrap().summary();
    assert_eq!(summary.total_products, 4);
    let recent: Vec<&str> = summary.recent_products.iter().map(CatalogEntry::name).collect();
    assert_eq!(recent, vec!["First", "Second", "Third"]);
}
