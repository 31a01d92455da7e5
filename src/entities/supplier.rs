//! Supplier entity - Vendors that stock catalog products.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    /// Unique identifier for the supplier
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_name: String,
    pub email: String,
    /// Price the supplier charges per unit
    pub cost_per_unit: f64,
    /// Smallest order the supplier accepts
    pub minimum_quantity: i32,
}

/// Defines relationships between Supplier and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Product links for this supplier
    #[sea_orm(has_many = "super::product_supplier::Entity")]
    ProductSupplier,
}

impl Related<super::product_supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSupplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
