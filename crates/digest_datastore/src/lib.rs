//! # DataStore Module
//!
//! This module keeps track of which feed items have already been summarized and
//! emailed, so that a scheduled run never notifies about the same item twice.
//!
//! A marker is only ever inserted; nothing here updates or deletes one. Two backends
//! are provided: Postgres via sqlx, and a log-only stand-in for offline runs.

mod datastore;
mod domain;

pub use datastore::log_only::LogOnlyDataStore;
pub use datastore::postgres::{validate_table_name, PgDataStore};
pub use datastore::DataStore;
pub use domain::ProcessedMarker;
