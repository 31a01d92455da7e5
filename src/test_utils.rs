//! Shared test utilities for the catalog view.
//!
//! This module provides an in-memory catalog source with call counters and
//! injectable failures, sample catalog data, and helpers for waiting on
//! stream values without hanging a test.

use crate::{
    config::seed::CatalogSeed,
    errors::{Error, Result},
    models::{Category, Product, Supplier},
    reactive::Subscription,
    source::CatalogSource,
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// How long a test waits for a stream value before treating it as absent.
pub const WAIT: Duration = Duration::from_millis(500);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Next value from `subscription`, or `None` if it completed or nothing
/// arrived within [`WAIT`].
pub async fn next_within<T: Clone>(subscription: &mut Subscription<T>) -> Option<T> {
    tokio::time::timeout(WAIT, subscription.next())
        .await
        .ok()
        .flatten()
}

/// Creates an in-memory `SQLite` database with all catalog tables.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A raw product as a source would return it: no derived fields, no suppliers.
pub fn raw_product(id: i64, name: &str, category_id: i64, price: f64) -> Product {
    Product {
        id,
        product_name: name.to_string(),
        product_code: format!("TST-{id:04}"),
        description: format!("{name} for tests"),
        price,
        category_id,
        quantity_in_stock: 10,
        supplier_ids: Vec::new(),
        category: None,
        search_key: Vec::new(),
    }
}

pub fn sample_categories() -> Vec<Category> {
    [(1, "Garden"), (3, "Toolbox"), (5, "Gaming")]
        .into_iter()
        .map(|(id, name)| Category {
            id,
            name: name.to_string(),
        })
        .collect()
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            supplier_ids: vec![1, 2],
            ..raw_product(1, "Leaf Rake", 1, 19.95)
        },
        Product {
            supplier_ids: vec![3],
            ..raw_product(2, "Garden Cart", 1, 32.99)
        },
        Product {
            supplier_ids: vec![4, 5],
            ..raw_product(5, "Hammer", 3, 8.9)
        },
        Product {
            supplier_ids: vec![6],
            ..raw_product(8, "Saw", 3, 11.55)
        },
    ]
}

pub fn sample_suppliers() -> Vec<Supplier> {
    (1..=6)
        .map(|id| Supplier {
            id,
            company_name: format!("Supplier {id}"),
            email: format!("supplier{id}@example.com"),
            cost_per_unit: 2.5,
            minimum_quantity: 12,
        })
        .collect()
}

pub fn sample_seed() -> CatalogSeed {
    CatalogSeed {
        categories: sample_categories(),
        suppliers: sample_suppliers(),
        products: sample_products(),
    }
}

/// In-memory [`CatalogSource`] for driving the view in tests.
#[derive(Debug, Default)]
pub struct FakeCatalogSource {
    products: Vec<Product>,
    categories: Vec<Category>,
    suppliers: HashMap<i64, Supplier>,
    fail_products: bool,
    fail_categories: bool,
    gates: HashMap<i64, Arc<Notify>>,
    product_calls: AtomicUsize,
    category_calls: AtomicUsize,
    supplier_calls: AtomicUsize,
}

impl FakeCatalogSource {
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products,
            categories,
            ..Self::default()
        }
    }

    /// The sample catalog, categories, and suppliers.
    pub fn sample() -> Self {
        Self::new(sample_products(), sample_categories()).with_suppliers(sample_suppliers())
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_suppliers(mut self, suppliers: Vec<Supplier>) -> Self {
        self.suppliers = suppliers.into_iter().map(|s| (s.id, s)).collect();
        self
    }

    pub fn failing_products(mut self) -> Self {
        self.fail_products = true;
        self
    }

    pub fn failing_categories(mut self) -> Self {
        self.fail_categories = true;
        self
    }

    /// Makes `fetch_supplier(id)` wait until the returned gate is notified.
    pub fn gated_supplier(mut self, id: i64) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gates.insert(id, Arc::clone(&gate));
        (self, gate)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    pub fn supplier_calls(&self) -> usize {
        self.supplier_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_products {
            return Err(Error::Fetch {
                resource: "products".to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        Ok(self.products.clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_categories {
            return Err(Error::Fetch {
                resource: "categories".to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        Ok(self.categories.clone())
    }

    async fn fetch_supplier(&self, id: i64) -> Result<Supplier> {
        self.supplier_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gates.get(&id) {
            gate.notified().await;
        }
        self.suppliers
            .get(&id)
            .cloned()
            .ok_or(Error::SupplierNotFound { id })
    }
}
