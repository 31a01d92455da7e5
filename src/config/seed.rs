//! Catalog seed loading from catalog.toml
//!
//! The seed file lists categories, suppliers, and products (with their
//! supplier ids). It is used to populate an empty database.

use crate::errors::{Error, Result};
use crate::models::{Category, Product, Supplier};
use serde::Deserialize;
use std::path::Path;

/// Seed data for the catalog tables
#[derive(Debug, Deserialize, Default)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Loads catalog seed data from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid seed TOML.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<CatalogSeed> {
    let path_ref = path.as_ref();
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path_ref.display()),
    })?;
    parse_seed(&contents)
}

/// Parses catalog seed data from TOML text
///
/// # Errors
/// Returns an error if the text is not valid seed TOML.
pub fn parse_seed(contents: &str) -> Result<CatalogSeed> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog seed: {e}"),
    })
}
