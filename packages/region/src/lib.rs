#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region hierarchy storage.
//!
//! Holds province, district, and subdistrict boundaries loaded
//! incrementally from a [`provider::GeometryProvider`]. Tiers that have
//! not been loaded are simply absent; consumers treat them as invisible
//! rather than as an error.

pub mod provider;
pub mod search;
pub mod store;

pub use store::{LoadReport, RegionStore, SkipReason};

use thiserror::Error;

/// Errors that can occur while fetching region geometry.
#[derive(Debug, Error)]
pub enum RegionError {
    /// Reading a geometry file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Geometry payload was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider returned something other than a list of regions.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },
}
