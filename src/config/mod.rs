//! Configuration module
//!
//! Provides types, discovery and parsing for `posepaint.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
