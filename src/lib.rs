//! Client for the Eurostat bulk-download service.
//!
//! Fetches a bulk dataset by code, reshapes the wide matrix into a tidy
//! row-column-value table, and caches the result on disk keyed by the
//! request parameters.

pub mod app;
pub mod bulk;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod table;
pub mod tidy;
