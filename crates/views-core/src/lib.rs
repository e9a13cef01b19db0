//! Shared domain layer for wikiviews.
//!
//! Holds the data model, the error type, CLI settings with last-used
//! persistence, number formatting and calendar helpers used by the data,
//! runtime and UI crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
