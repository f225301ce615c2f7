//! Location extraction, deduplication and canonicalization for episodic
//! scripts and production breakdowns.
//!
//! The engine is a pure function of its inputs: give it every episode of a
//! run and an optional reference list, get back a deduplicated catalog of
//! locations with their sub-locations and per-episode usage. Bad input
//! never errors; it produces fewer mentions or unbound groups.

pub mod attach;
pub mod breakdown;
pub mod canonical;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod hierarchy;
pub mod normalize;
pub mod parser;
pub mod scanner;
pub mod similarity;
pub mod usage;

pub use catalog::{Catalog, CatalogStats, build_catalog, extend_catalog, seed_from_references};
pub use config::MatchConfig;
pub use error::CatalogError;
pub use location_types::*;
