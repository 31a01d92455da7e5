//! Data collaborators the catalog view fetches from.
//!
//! The view only ever talks to a [`CatalogSource`]; how records are actually
//! retrieved (HTTP, SQL, fixtures) is up to the implementation.

/// SeaORM-backed source over SQLite
pub mod database;

pub use database::DatabaseCatalogSource;

use crate::errors::Result;
use crate::models::{Category, Product, Supplier};
use async_trait::async_trait;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Retrieves the raw product list. Derived fields are left empty.
    async fn fetch_products(&self) -> Result<Vec<Product>>;

    /// Retrieves every category.
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// Retrieves one supplier by id.
    async fn fetch_supplier(&self, id: i64) -> Result<Supplier>;
}
