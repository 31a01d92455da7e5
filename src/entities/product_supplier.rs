//! Product-supplier link entity - Which suppliers stock which product.
//!
//! Links are read back in insertion order, which is the order suppliers are
//! shown for a product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product-supplier link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_suppliers")]
pub struct Model {
    /// Unique identifier for the link; also its display order
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub supplier_id: i64,
}

/// Defines relationships between the link and the rows it joins
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
