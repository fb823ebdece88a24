//! # Core Module
//!
//! The output side of the poller: what an observation is and how batches of
//! observations reach their consumers.
//!
//! ## Core Components:
//!
//! - **`observation`**: `Observation`, `MetricKind` and `Unit`.
//! - **`dispatcher`**: The `ObservationSink` trait and the fan-out
//!   `Dispatcher` that shares each batch among many subscribers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Observation value types.
pub mod observation;
/// Sink trait and fan-out dispatcher.
pub mod dispatcher;

pub use dispatcher::{Dispatcher, ObservationFrame, ObservationSink};
pub use observation::{MetricKind, Observation, Unit};
