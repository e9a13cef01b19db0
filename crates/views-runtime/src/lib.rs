//! Runtime layer for wikiviews.
//!
//! Drives the report pipeline over the data layer and hands the finished
//! outcome to the UI.

pub mod orchestrator;

pub use views_core as core;
pub use views_data as data;
