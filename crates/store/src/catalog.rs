//! Catalog store: products collection.

use std::path::Path;

use async_trait::async_trait;
use common::ProductId;
use domain::{Product, ProductUpdate};

use crate::collection::JsonCollection;
use crate::error::{Result, StoreError};

/// The narrow catalog interface the rest of the system consumes.
///
/// Stock adjustments are best-effort by design: the order workflow must
/// tolerate a product that was deleted after purchase, so the adjust
/// methods return `Ok(None)` rather than failing when the product is gone.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns all products.
    async fn all(&self) -> Result<Vec<Product>>;

    /// Returns a product by id.
    async fn get(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a new product.
    async fn insert(&self, product: Product) -> Result<Product>;

    /// Applies a partial update, returning the updated product.
    async fn update(&self, id: ProductId, update: ProductUpdate) -> Result<Product>;

    /// Removes a product.
    async fn delete(&self, id: ProductId) -> Result<()>;

    /// Decrements stock by the purchased quantity, saturating at zero.
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>>;

    /// Restores stock after a cancellation.
    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>>;
}

/// JSON-file-backed catalog.
pub struct JsonCatalog {
    products: JsonCollection<Product>,
}

impl JsonCatalog {
    /// Opens the catalog at `<data_dir>/products.json`.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self {
            products: JsonCollection::new(data_dir.as_ref().join("products.json")),
        }
    }
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn all(&self) -> Result<Vec<Product>> {
        self.products.read_all().await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        let products = self.products.read_all().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    async fn insert(&self, product: Product) -> Result<Product> {
        let inserted = product.clone();
        self.products
            .try_mutate(move |products| {
                products.push(product);
                Ok(())
            })
            .await?;
        Ok(inserted)
    }

    async fn update(&self, id: ProductId, update: ProductUpdate) -> Result<Product> {
        self.products
            .try_mutate(move |products| {
                let product = products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(StoreError::ProductNotFound(id))?;
                update.apply_to(product);
                Ok(product.clone())
            })
            .await
    }

    async fn delete(&self, id: ProductId) -> Result<()> {
        self.products
            .try_mutate(move |products| {
                let before = products.len();
                products.retain(|p| p.id != id);
                if products.len() == before {
                    return Err(StoreError::ProductNotFound(id));
                }
                Ok(())
            })
            .await
    }

    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>> {
        self.products
            .try_mutate(move |products| {
                let Some(product) = products.iter_mut().find(|p| p.id == id) else {
                    return Ok(None);
                };
                product.stock = product.stock.saturating_sub(quantity);
                product.updated_at = chrono::Utc::now();
                Ok(Some(product.clone()))
            })
            .await
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>> {
        self.products
            .try_mutate(move |products| {
                let Some(product) = products.iter_mut().find(|p| p.id == id) else {
                    return Ok(None);
                };
                product.stock += quantity;
                product.updated_at = chrono::Utc::now();
                Ok(Some(product.clone()))
            })
            .await
    }
}
