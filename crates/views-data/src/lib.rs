//! Data layer for wikiviews.
//!
//! Talks to the MediaWiki action API and the Wikimedia pageviews REST API.
//! Contribution pages fold into a title → first-edit map; view totals are
//! summed over month-aligned windows. The flat CSV files a report leaves
//! behind live in [`files`].

pub mod client;
pub mod contributions;
pub mod files;
pub mod pageviews;

pub use views_core as core;
