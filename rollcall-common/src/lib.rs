//! # Rollcall Common Library
//!
//! Shared code for the rollcall workspace:
//! - Error type used across crates
//! - Bootstrap configuration loading (TOML, environment, CLI)
//! - SQLite initialization and store row models

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
