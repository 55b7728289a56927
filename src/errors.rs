//! Unified error type for the recipe core.
//!
//! Every core operation returns [`Result`]. Variants are structured so callers
//! (HTTP layer, CLI, tests) can match on the failure kind instead of parsing text.

use crate::core::relations::Ledger;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All failures the recipe core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file missing, unreadable or malformed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Any persistence failure that has no more specific variant
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem failure (seed files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// The (user, target) pair is already recorded in the ledger
    #[error("{target_id} is already in {ledger}")]
    AlreadyExists {
        /// Which relationship table
        ledger: Ledger,
        /// Recipe or author id
        target_id: i64,
    },

    /// The (user, target) pair is not recorded in the ledger
    #[error("{target_id} is not in {ledger}")]
    NotFound {
        /// Which relationship table
        ledger: Ledger,
        /// Recipe or author id
        target_id: i64,
    },

    /// Operation is never allowed, e.g. following yourself
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation was rejected
        message: String,
    },

    /// A recipe was submitted without ingredient lines
    #[error("A recipe needs at least one ingredient")]
    MissingIngredients,

    /// Ingredient id does not resolve in the catalog
    #[error("Unknown ingredient id {id}")]
    UnknownIngredient {
        /// Offending id
        id: i64,
    },

    /// Ingredient id appears more than once in a submission
    #[error("Ingredient id {id} is listed more than once")]
    DuplicateIngredient {
        /// Offending id
        id: i64,
    },

    /// Ingredient amount outside the configured bounds
    #[error("Amount {amount} is outside the allowed range [{min}, {max}]")]
    AmountOutOfRange {
        /// Submitted amount
        amount: i32,
        /// Lower bound (inclusive)
        min: i32,
        /// Upper bound (inclusive)
        max: i32,
    },

    /// Cooking time outside the configured bounds
    #[error("Cooking time {minutes} is outside the allowed range [{min}, {max}]")]
    CookingTimeOutOfRange {
        /// Submitted cooking time in minutes
        minutes: i32,
        /// Lower bound (inclusive)
        min: i32,
        /// Upper bound (inclusive)
        max: i32,
    },

    /// Tag id does not exist
    #[error("Unknown tag id {id}")]
    UnknownTag {
        /// Offending id
        id: i64,
    },

    /// Recipe id does not exist
    #[error("Recipe {id} not found")]
    RecipeNotFound {
        /// Requested id
        id: i64,
    },

    /// User id does not exist
    #[error("User {id} not found")]
    UserNotFound {
        /// Requested id
        id: i64,
    },

    /// Only the author may change or delete a recipe
    #[error("User {user_id} is not the author of recipe {recipe_id}")]
    NotRecipeAuthor {
        /// Recipe being edited
        recipe_id: i64,
        /// User attempting the edit
        user_id: i64,
    },

    /// A unique field (username, email, tag name/slug) is already taken
    #[error("{field} '{value}' is already taken")]
    Duplicate {
        /// Field name
        field: &'static str,
        /// Submitted value
        value: String,
    },

    /// Field failed a format check
    #[error("Invalid {field}: {message}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

/// Returns true when the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    unique_violation_detail(err).is_some()
}

/// Driver message of a unique-index rejection, e.g. `UNIQUE constraint failed: users.email`.
pub(crate) fn unique_violation_detail(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
