//! # lib_dsn
//!
//! Polls NASA's Deep Space Network "DSN Now" feed, resolves spacecraft codes
//! to friendly names and republishes uplink power and frequency readings as
//! observations.
//!
//! Data flow: timer tick → `ApiCallDsn::fetch_live_data` → observation
//! extraction → `SpacecraftFinder::resolve` per signal → `ObservationSink`.

#![forbid(unsafe_code)]

pub mod core;
pub mod error;
pub mod feeds;
pub mod ingestors;
pub mod retrieve;
pub mod utils;

// Re-export the types most callers need.
pub use crate::core::{Dispatcher, MetricKind, Observation, ObservationSink, Unit};
pub use error::DsnError;
pub use feeds::dsn::{ApiCallDsn, ConfigDocument, DsnFeed, LiveSnapshot, SpacecraftFinder};
pub use ingestors::DsnPollingPlugin;
pub use retrieve::ClientOptions;
