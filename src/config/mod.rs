/// Database connection, table creation, and seeding
pub mod database;

/// Catalog seed loading from catalog.toml
pub mod seed;

/// Application and view configuration from config.toml
pub mod view;
