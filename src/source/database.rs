//! `SeaORM` catalog source.
//!
//! Reads the raw catalog from the `products`, `categories`, `suppliers`, and
//! `product_suppliers` tables. Derived product fields are left empty; the
//! view fills them in at join time.

use super::CatalogSource;
use crate::{
    entities::{self, category, product, product_supplier, supplier},
    errors::{Error, Result},
    models::{Category, Product, Supplier},
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::collections::HashMap;
use tracing::debug;

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<supplier::Model> for Supplier {
    fn from(model: supplier::Model) -> Self {
        Self {
            id: model.id,
            company_name: model.company_name,
            email: model.email,
            cost_per_unit: model.cost_per_unit,
            minimum_quantity: model.minimum_quantity,
        }
    }
}

fn to_product(model: product::Model, supplier_ids: Vec<i64>) -> Product {
    Product {
        id: model.id,
        product_name: model.product_name,
        product_code: model.product_code,
        description: model.description,
        price: model.price,
        category_id: model.category_id,
        quantity_in_stock: model.quantity_in_stock,
        supplier_ids,
        category: None,
        search_key: Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseCatalogSource {
    db: DatabaseConnection,
}

impl DatabaseCatalogSource {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogSource for DatabaseCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let products = entities::Product::find()
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        let links = entities::ProductSupplier::find()
            .order_by_asc(product_supplier::Column::Id)
            .all(&self.db)
            .await?;

        let mut suppliers_by_product: HashMap<i64, Vec<i64>> = HashMap::new();
        for link in links {
            suppliers_by_product
                .entry(link.product_id)
                .or_default()
                .push(link.supplier_id);
        }
        debug!("Loaded {} products from the database", products.len());

        Ok(products
            .into_iter()
            .map(|model| {
                let supplier_ids = suppliers_by_product.remove(&model.id).unwrap_or_default();
                to_product(model, supplier_ids)
            })
            .collect())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let categories = entities::Category::find()
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    async fn fetch_supplier(&self, id: i64) -> Result<Supplier> {
        entities::Supplier::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or(Error::SupplierNotFound { id })
    }
}
