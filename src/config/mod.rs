/// Database connection and table creation
pub mod database;

/// Application settings and recipe rules loaded from config.toml
pub mod settings;
