//! Product entity - Raw catalog products as stored.
//!
//! Only source fields live here. The category name and search key are
//! derived by the view at join time and are never stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Leaf Rake", "Hammer")
    pub product_name: String,
    /// Catalog code (e.g., "GDN-0011")
    pub product_code: String,
    pub description: String,
    /// Source price, before markup
    pub price: f64,
    /// ID of the category this product belongs to
    pub category_id: i64,
    pub quantity_in_stock: i32,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Supplier links for this product
    #[sea_orm(has_many = "super::product_supplier::Entity")]
    ProductSupplier,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSupplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
