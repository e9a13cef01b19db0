//! Console and chart layer for wikiviews.
//!
//! Prints the ranked report as a bordered table built with [`ratatui`],
//! and draws the optional bar and line charts with [`plotters`].

pub mod app;
pub mod charts;
pub mod table_view;

pub use views_core as core;
