//! # Data Ingestors Module
//!
//! Long-running clients that pull data from a feed on their own schedule and
//! push the result to a sink.
//!
//! ## Contained Modules:
//! - **`dsn_polling`**: The timer-driven DSN Now poller, which turns live dish
//!   status into power and frequency observations per spacecraft.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The timer-driven poller for the DSN Now feed.
pub mod dsn_polling;

// --- Public API Re-exports ---
pub use dsn_polling::{DsnPollingPlugin, PollStats, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
