//! # Data Retrieval Module
//!
//! Generic HTTP plumbing used by the feed clients. Feed-specific code lives
//! under `feeds`; this module only knows how to issue requests and report
//! what came back.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, a text-oriented client built on `reqwest`
//!   and `reqwest-middleware`, with an optional retry policy.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with optional retry middleware.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse, ClientOptions};
