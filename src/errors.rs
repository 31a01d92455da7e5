//! Unified error type for the catalog view.
//!
//! Errors raised inside the reactive graph never escape a stream as a panic:
//! the stream that hit them turns them into an error-channel message and
//! completes. This enum is what the message text is rendered from.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("Product {product_id} references unknown category {category_id}")]
    UnknownCategory { product_id: i64, category_id: i64 },

    #[error("Supplier {id} not found")]
    SupplierNotFound { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
