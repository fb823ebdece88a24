//! # Telemetry Feeds Module
//!
//! Clients and data models for the external telemetry sources the poller
//! reads. Each submodule owns one provider.
//!
//! ## Contained Modules:
//!
//! - **`dsn`**: NASA Deep Space Network "DSN Now" dish status.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Client, models and name resolution for the DSN Now feed.
pub mod dsn;
