//! revsync-core - Core library for revsync
//!
//! This crate contains the review models, the libSQL-backed record and
//! settings stores, the Places API client, and the sync job that reconciles
//! fetched reviews against stored records.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod places;
pub mod sanitize;
pub mod schedule;
pub mod services;
pub mod sync;
pub mod trigger;
pub mod util;

pub use error::{Error, Result};
pub use models::{ReviewId, ReviewRecord, SyncFrequency, SyncSettings};
pub use sync::{SyncError, SyncOutcome};
