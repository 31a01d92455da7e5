//! Core view logic - the derived catalog streams and the session that wires them.

/// Accumulating catalog: enriched catalog plus local insertions
pub mod accumulate;
/// Enriched catalog: products joined with categories
pub mod enrich;
/// Filtered view and product selection joins
pub mod selection;
/// Switch-to-latest supplier detail
pub mod supplier;
/// The catalog view session
pub mod view;

pub use view::CatalogView;
