//! Core module - Framework-agnostic recipe business logic.
//! Every operation takes a database connection plus plain values and returns
//! [`crate::errors::Result`], so HTTP handlers, the bootstrap binary and tests
//! all call the same functions.

pub mod catalog;
pub mod filter;
pub mod recipe;
pub mod relations;
pub mod shopping_list;
pub mod user;
pub mod validation;
