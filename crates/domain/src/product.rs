//! Catalog product entity.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A catalog product.
///
/// `stock` is unsigned so it cannot go negative; a product with
/// `available == false` is hidden from the shop and never purchasable,
/// whatever its stock says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub stock: u32,
    pub available: bool,
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub braille_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if the product can be bought in the given quantity.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.available && quantity > 0 && self.stock >= quantity
    }
}

/// Fields supplied when an admin creates a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    #[serde(default)]
    pub collection: Option<String>,
    pub stock: u32,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub braille_message: Option<String>,
    #[serde(default)]
    pub decoded_message: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub materials: Option<String>,
}

fn default_true() -> bool {
    true
}

impl NewProduct {
    /// Materializes the product with a fresh id and timestamps.
    pub fn into_product(self) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            collection: self.collection,
            stock: self.stock,
            available: self.available,
            featured: self.featured,
            images: self.images,
            braille_message: self.braille_message,
            decoded_message: self.decoded_message,
            dimensions: self.dimensions,
            materials: self.materials,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a product; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub collection: Option<Option<String>>,
    pub stock: Option<u32>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
    pub braille_message: Option<Option<String>>,
    pub decoded_message: Option<Option<String>>,
    pub dimensions: Option<Option<String>>,
    pub materials: Option<Option<String>>,
}

impl ProductUpdate {
    /// Applies the update in place and bumps `updated_at`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(collection) = self.collection {
            product.collection = collection;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(braille_message) = self.braille_message {
            product.braille_message = braille_message;
        }
        if let Some(decoded_message) = self.decoded_message {
            product.decoded_message = decoded_message;
        }
        if let Some(dimensions) = self.dimensions {
            product.dimensions = dimensions;
        }
        if let Some(materials) = self.materials {
            product.materials = materials;
        }
        product.updated_at = Utc::now();
    }
}
