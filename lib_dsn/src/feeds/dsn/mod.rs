//! # DSN Now Integration Module
//!
//! Everything specific to NASA's Deep Space Network "DSN Now" feed: the
//! client, the document models and the spacecraft name table.
//!
//! ## Contained Modules:
//!
//! - **`xml_map`**: XML → nested mapping conversion with `@attribute` keys.
//! - **`model`**: `ConfigDocument` and `LiveSnapshot`, including the
//!   single-versus-list normalization of repeatable elements.
//! - **`apicalldsn`**: The `DsnFeed` trait and its HTTP implementation.
//! - **`spacecraft`**: `SpacecraftFinder`, the cached code → name resolver.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// XML to `serde_json::Value` conversion.
pub mod xml_map;
/// Typed views over the configuration and live-data documents.
pub mod model;
/// HTTP client for the DSN Now documents.
pub mod apicalldsn;
/// Spacecraft code to friendly name resolution.
pub mod spacecraft;

pub use apicalldsn::{cache_buster, ApiCallDsn, DsnFeed};
pub use model::{ConfigDocument, DishRecord, LiveSnapshot, SignalRecord, SpacecraftEntry, TargetRecord};
pub use spacecraft::SpacecraftFinder;
