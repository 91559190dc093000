//! # Intel Harness Core
//!
//! Shared, I/O-free logic for Intel Harness: record models, the field
//! registry, the CSV import pipeline, filter evaluation, per-record match
//! scanning and cross-entity result aggregation.
//!
//! This crate contains no tokio, HTTP, filesystem I/O, or other
//! native-only dependencies. The record store is reached through the
//! [`store::RecordStore`] trait; the calling application supplies the
//! implementation.

pub mod aggregate;
pub mod csv_record;
pub mod dates;
pub mod filter;
pub mod import;
pub mod matcher;
pub mod models;
pub mod registry;
pub mod store;
