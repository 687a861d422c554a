//! Product records and submission validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const NAME_MIN_CHARS: usize = 3;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DETAILS_MIN_CHARS: usize = 10;

/// A product as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Comma-separated feature phrases, stored as written
    pub details: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Email of the creator, or `unknown`
    pub created_by: String,
}

/// A product ready to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub details: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl ProductRecord {
    pub fn with_id(self, id: String) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            details: self.details,
            image: self.image,
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
        }
    }
}

/// Lower-cased, whitespace-runs-to-dash form of a product name.
///
/// Used in product page URLs: `"USB-C  Hub"` becomes `"usb-c-hub"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
        } else {
            in_whitespace = false;
            slug.extend(ch.to_lowercase());
        }
    }
    slug
}

/// Key under which names are compared for uniqueness
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Price as sent by a client: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn is_present(&self) -> bool {
        match self {
            PriceInput::Number(_) => true,
            PriceInput::Text(text) => !text.trim().is_empty(),
        }
    }

    fn parse(&self) -> Option<f64> {
        let value = match self {
            PriceInput::Number(n) => *n,
            PriceInput::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

/// Body of a product submission, before validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A submission that passed validation, fields trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub details: String,
    pub image: String,
}

impl NewProduct {
    /// Stamp creation metadata; both timestamps get the same instant.
    pub fn stamp(self, created_by: &str, now: DateTime<Utc>) -> ProductRecord {
        ProductRecord {
            name: self.name,
            description: self.description,
            price: self.price,
            details: self.details,
            image: self.image,
            created_at: now,
            updated_at: now,
            created_by: created_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields(Vec<&'static str>),

    #[error("Price must be a positive number")]
    InvalidPrice,

    #[error("{message}")]
    Field {
        field: &'static str,
        message: &'static str,
    },

    #[error("Invalid request body: {0}")]
    Malformed(String),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProductSubmission {
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Check the submission in order: presence, price, field rules.
    pub fn validate(&self) -> Result<NewProduct, ValidationError> {
        let fields = (
            present(&self.name),
            present(&self.description),
            self.price.as_ref().filter(|price| price.is_present()),
            present(&self.details),
            present(&self.image),
        );
        let (Some(name), Some(description), Some(price), Some(details), Some(image)) = fields
        else {
            let (name, description, price, details, image) = fields;
            let missing = [
                ("name", name.is_none()),
                ("description", description.is_none()),
                ("price", price.is_none()),
                ("details", details.is_none()),
                ("image", image.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            return Err(ValidationError::MissingFields(missing));
        };

        let price = price.parse().ok_or(ValidationError::InvalidPrice)?;

        if name.chars().count() < NAME_MIN_CHARS {
            return Err(ValidationError::Field {
                field: "name",
                message: "Product name must be at least 3 characters",
            });
        }
        if description.chars().count() < DESCRIPTION_MIN_CHARS {
            return Err(ValidationError::Field {
                field: "description",
                message: "Description must be at least 10 characters",
            });
        }
        if details.chars().count() < DETAILS_MIN_CHARS {
            return Err(ValidationError::Field {
                field: "details",
                message: "Details must be at least 10 characters",
            });
        }
        if Url::parse(image).is_err() {
            return Err(ValidationError::Field {
                field: "image",
                message: "Please enter a valid image URL",
            });
        }

        Ok(NewProduct {
            name: name.to_string(),
            description: description.to_string(),
            price,
            details: details.to_string(),
            image: image.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> ProductSubmission {
        serde_json::from_value(value).unwrap()
    }

    fn hub() -> serde_json::Value {
        json!({
            "name": "  USB-C Hub ",
            "description": "A compact multiport hub",
            "price": 29.99,
            "details": "4 ports, USB-C, aluminum",
            "image": "https://example.com/hub.jpg"
        })
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let product = submission(hub()).validate().unwrap();
        assert_eq!(product.name, "USB-C Hub");
        assert_eq!(product.price, 29.99);
        assert_eq!(product.image, "https://example.com/hub.jpg");
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = submission(json!({ "name": "Hub", "price": 10, "image": "   " }))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["description", "details", "image"])
        );
        assert_eq!(err.to_string(), "All fields are required");
    }

    #[test]
    fn test_empty_submission_names_every_field() {
        let err = ProductSubmission::from_json(b"{}")
            .unwrap()
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["name", "description", "price", "details", "image"])
        );
    }

    #[test]
    fn test_price_as_numeric_string() {
        let mut body = hub();
        body["price"] = json!(" 12.5 ");
        assert_eq!(submission(body).validate().unwrap().price, 12.5);
    }

    #[test]
    fn test_invalid_prices() {
        for price in [json!(0), json!(-3.5), json!("abc"), json!("NaN"), json!("inf")] {
            let mut body = hub();
            body["price"] = price.clone();
            assert_eq!(
                submission(body).validate(),
                Err(ValidationError::InvalidPrice),
                "price {price} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_price_string_is_missing() {
        let mut body = hub();
        body["price"] = json!("");
        assert!(matches!(
            submission(body).validate(),
            Err(ValidationError::MissingFields(fields)) if fields == vec!["price"]
        ));
    }

    #[test]
    fn test_price_checked_before_field_rules() {
        let mut body = hub();
        body["name"] = json!("ab");
        body["price"] = json!(-1);
        assert_eq!(submission(body).validate(), Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn test_field_rules() {
        let cases = [
            ("name", json!("ab"), "Product name must be at least 3 characters"),
            ("description", json!("too short"), "Description must be at least 10 characters"),
            ("details", json!("tiny"), "Details must be at least 10 characters"),
            ("image", json!("not a url"), "Please enter a valid image URL"),
            ("image", json!("/images/hub.jpg"), "Please enter a valid image URL"),
        ];
        for (field, value, expected) in cases {
            let mut body = hub();
            body[field] = value;
            let err = submission(body).validate().unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            ProductSubmission::from_json(b"{\"name\": 5}"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            ProductSubmission::from_json(b""),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_stamp_uses_one_instant() {
        let now = Utc::now();
        let record = submission(hub())
            .validate()
            .unwrap()
            .stamp("user@example.com", now);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.created_by, "user@example.com");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("USB-C Hub"), "usb-c-hub");
        assert_eq!(slugify("Wireless   Charging\tPad"), "wireless-charging-pad");
        assert_eq!(slugify("MagSafe"), "magsafe");
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_key(" Widget "), name_key("widget"));
    }
}
