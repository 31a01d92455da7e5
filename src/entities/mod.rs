//! Entity module - SeaORM entity definitions for the catalog tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod product;
pub mod product_supplier;
pub mod supplier;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_supplier::{
    Column as ProductSupplierColumn, Entity as ProductSupplier, Model as ProductSupplierModel,
};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
