//! Application settings loading from config.toml
//!
//! The TOML file carries the database location, the path of the ingredient seed
//! file, the tags to seed, and the [`RecipeRules`] that bound ingredient amounts and
//! cooking times. `DATABASE_URL` from the environment takes precedence over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database URL; overridden by `DATABASE_URL`
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// JSON file holding the ingredient catalog
    #[serde(default = "default_ingredients_path")]
    pub ingredients_path: String,
    /// Validation bounds and relationship policy
    #[serde(default)]
    pub rules: RecipeRules,
    /// Tags to create on startup
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

/// Bounds and policies applied by recipe validation and the relationship ledger.
///
/// Passed explicitly into every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecipeRules {
    /// Smallest accepted ingredient amount (inclusive)
    pub min_amount: i32,
    /// Largest accepted ingredient amount (inclusive)
    pub max_amount: i32,
    /// Shortest accepted cooking time in minutes (inclusive)
    pub min_cooking_time: i32,
    /// Longest accepted cooking time in minutes (inclusive)
    pub max_cooking_time: i32,
    /// Whether authors may favorite their own recipes
    pub allow_self_favorite: bool,
}

impl Default for RecipeRules {
    fn default() -> Self {
        Self {
            min_amount: 1,
            max_amount: 1000,
            min_cooking_time: 1,
            max_cooking_time: 1000,
            allow_self_favorite: true,
        }
    }
}

/// Configuration for a single seeded tag
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TagConfig {
    /// Display name
    pub name: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
    /// URL-safe identifier
    pub slug: String,
}

fn default_database_url() -> String {
    "sqlite://data/recipe_box.sqlite?mode=rwc".to_string()
}

fn default_ingredients_path() -> String {
    "data/ingredients.json".to_string()
}

impl AppConfig {
    /// Checks that the configured bounds form non-empty ranges.
    ///
    /// # Errors
    /// Returns `Error::Config` if a minimum exceeds its maximum or a minimum is negative.
    pub fn validate(&self) -> Result<()> {
        let rules = &self.rules;
        if rules.min_amount < 0 || rules.min_amount > rules.max_amount {
            return Err(Error::Config {
                message: format!(
                    "Invalid amount bounds [{}, {}]",
                    rules.min_amount, rules.max_amount
                ),
            });
        }
        if rules.min_cooking_time < 0 || rules.min_cooking_time > rules.max_cooking_time {
            return Err(Error::Config {
                message: format!(
                    "Invalid cooking time bounds [{}, {}]",
                    rules.min_cooking_time, rules.max_cooking_time
                ),
            });
        }
        Ok(())
    }
}

/// Parses configuration from TOML text and applies the `DATABASE_URL` override.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or the bounds are inconsistent.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if let Ok(url) = std::env::var("DATABASE_URL") {
        tracing::debug!("DATABASE_URL set in environment, overriding config file");
        config.database_url = url;
    }

    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The configured bounds are inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Loads configuration from `RECIPE_BOX_CONFIG`, or ./config.toml when unset.
///
/// # Errors
/// Same as [`load_config`].
pub fn load_default_config() -> Result<AppConfig> {
    let path =
        std::env::var("RECIPE_BOX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r##"
            ingredients_path = "seed/ingredients.json"

            [rules]
            min_amount = 1
            max_amount = 500
            min_cooking_time = 5
            max_cooking_time = 240
            allow_self_favorite = false

            [[tags]]
            name = "Breakfast"
            color = "#E26C2D"
            slug = "breakfast"

            [[tags]]
            name = "Dinner"
            color = "#49B64E"
            slug = "dinner"
        "##;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ingredients_path, "seed/ingredients.json");
        assert_eq!(config.rules.max_amount, 500);
        assert_eq!(config.rules.min_cooking_time, 5);
        assert!(!config.rules.allow_self_favorite);
        assert_eq!(config.tags.len(), 2);
        assert_eq!(config.tags[1].slug, "dinner");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.rules, RecipeRules::default());
        assert_eq!(config.ingredients_path, "data/ingredients.json");
        assert!(config.tags.is_empty());
    }

    #[test]
    fn test_partial_rules_keep_remaining_defaults() {
        let config: AppConfig = toml::from_str("[rules]\nmax_amount = 50\n").unwrap();
        assert_eq!(config.rules.max_amount, 50);
        assert_eq!(config.rules.min_amount, 1);
        assert!(config.rules.allow_self_favorite);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config: AppConfig =
            toml::from_str("[rules]\nmin_amount = 10\nmax_amount = 5\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("rules = [");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
