//! # Catalog Feature
//!
//! Read-only client for the remote plant catalog: environments and a
//! paginated, name-sorted plant listing.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod client;

pub use client::{
    filter_by_environment, with_all_option, CatalogClient, CatalogError, CatalogPlant,
    Environment, ALL_ENVIRONMENTS_KEY,
};
