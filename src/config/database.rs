//! Database configuration module for the catalog source.
//!
//! This module handles `SQLite` connection, table creation, and seeding using
//! `SeaORM`. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::config::seed::CatalogSeed;
use crate::entities::{Category, Product, ProductSupplier, Supplier};
use crate::entities::{category, product, product_supplier, supplier};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
};
use tracing::info;

/// Gets the database URL from `DATABASE_URL`, falling back to an in-memory database.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(&get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates the catalog tables from the entity definitions.
///
/// Tables are created parents first so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut category_table = schema.create_table_from_entity(Category);
    let mut supplier_table = schema.create_table_from_entity(Supplier);
    let mut product_table = schema.create_table_from_entity(Product);
    let mut link_table = schema.create_table_from_entity(ProductSupplier);
    category_table.if_not_exists();
    supplier_table.if_not_exists();
    product_table.if_not_exists();
    link_table.if_not_exists();

    db.execute(builder.build(&category_table)).await?;
    db.execute(builder.build(&supplier_table)).await?;
    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&link_table)).await?;

    Ok(())
}

/// Populates the catalog tables from `seed` if they are empty.
///
/// Returns `true` when rows were inserted, `false` when the catalog already
/// had categories and seeding was skipped.
pub async fn seed_catalog(db: &DatabaseConnection, seed: &CatalogSeed) -> Result<bool> {
    if Category::find().count(db).await? > 0 {
        info!("Catalog already seeded; skipping.");
        return Ok(false);
    }

    if !seed.categories.is_empty() {
        Category::insert_many(seed.categories.iter().map(|c| category::ActiveModel {
            id: Set(c.id),
            name: Set(c.name.clone()),
        }))
        .exec(db)
        .await?;
    }

    if !seed.suppliers.is_empty() {
        Supplier::insert_many(seed.suppliers.iter().map(|s| supplier::ActiveModel {
            id: Set(s.id),
            company_name: Set(s.company_name.clone()),
            email: Set(s.email.clone()),
            cost_per_unit: Set(s.cost_per_unit),
            minimum_quantity: Set(s.minimum_quantity),
        }))
        .exec(db)
        .await?;
    }

    if !seed.products.is_empty() {
        Product::insert_many(seed.products.iter().map(|p| product::ActiveModel {
            id: Set(p.id),
            product_name: Set(p.product_name.clone()),
            product_code: Set(p.product_code.clone()),
            description: Set(p.description.clone()),
            price: Set(p.price),
            category_id: Set(p.category_id),
            quantity_in_stock: Set(p.quantity_in_stock),
        }))
        .exec(db)
        .await?;
    }

    let links: Vec<product_supplier::ActiveModel> = seed
        .products
        .iter()
        .flat_map(|p| {
            p.supplier_ids
                .iter()
                .map(move |&supplier_id| product_supplier::ActiveModel {
                    product_id: Set(p.id),
                    supplier_id: Set(supplier_id),
                    ..Default::default()
                })
        })
        .collect();
    if !links.is_empty() {
        ProductSupplier::insert_many(links).exec(db).await?;
    }

    info!(
        "Seeded catalog with {} categories, {} suppliers, {} products.",
        seed.categories.len(),
        seed.suppliers.len(),
        seed.products.len()
    );
    Ok(true)
}
