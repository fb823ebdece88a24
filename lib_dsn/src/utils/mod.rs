//! # Utilities Module
//!
//! General-purpose helpers shared across the `lib_dsn` crate that do not
//! belong to a specific feed or ingestor.
//!
//! ## Contained Modules:
//!
//! - **`clock`**: The injectable `Clock` trait with a system implementation
//!   and a fixed clock for deterministic tests.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Injectable wall-clock access.
pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
