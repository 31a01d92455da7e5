//! Domain types flowing through the catalog view.
//!
//! These are plain values: the reactive graph hands out immutable snapshots
//! and never mutates a published value in place.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sentinel id meaning "no filter" for categories and "no selection" for products.
pub const NO_SELECTION: i64 = 0;

/// An immutable snapshot of a product list shared between subscribers.
pub type Catalog = Arc<Vec<Product>>;

/// A catalog product.
///
/// `category` and `search_key` are derived at join time and are never read
/// back from a source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_name: String,
    pub product_code: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
    pub quantity_in_stock: i32,
    /// Suppliers for this product, in display order
    #[serde(default)]
    pub supplier_ids: Vec<i64>,
    /// Resolved category name (derived)
    #[serde(default)]
    pub category: Option<String>,
    /// Searchable strings derived from the product name
    #[serde(default)]
    pub search_key: Vec<String>,
}

impl Product {
    /// The canned product inserted when `insert_product` is called without one.
    #[must_use]
    pub fn placeholder() -> Self {
        let product_name = "Another One".to_string();
        Self {
            id: 42,
            search_key: search_key_for(&product_name),
            product_name,
            product_code: "TBX-0042".to_string(),
            description: "Our new product".to_string(),
            price: 8.9,
            category_id: 3,
            quantity_in_stock: 30,
            supplier_ids: Vec::new(),
            category: Some("Toolbox".to_string()),
        }
    }
}

/// Builds the search key for a product name: the name itself, then each of
/// its lowercase words.
#[must_use]
pub fn search_key_for(product_name: &str) -> Vec<String> {
    let mut key = vec![product_name.to_string()];
    for word in product_name.split_whitespace() {
        let word = word.to_lowercase();
        if !key.contains(&word) {
            key.push(word);
        }
    }
    key
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A supplier record. Everything but `id` is opaque to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub company_name: String,
    pub email: String,
    pub cost_per_unit: f64,
    pub minimum_quantity: i32,
}

/// Aggregated suppliers for one selected product.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierDetail {
    pub product_id: i64,
    pub suppliers: Vec<Supplier>,
}
