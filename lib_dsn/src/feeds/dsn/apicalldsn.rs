//! # DSN Now Feed Client
//!
//! Fetches the two public DSN Now documents and hands back their parsed forms.
//!
//! ## Core Features:
//! - **Two documents**: `config.xml` (the spacecraft code table, fetched once
//!   by the poller) and `data/dsn.xml` (live dish status, fetched every poll).
//! - **Cache busting**: live-data requests carry `r = floor(now / 5)`, so
//!   requests inside the same five-second bucket may be served by upstream
//!   caches while requests in different buckets are not.
//! - **One session per call**: every fetch builds its own `ApiClient`; no
//!   connection is reused between calls.
//! - **No hidden retries**: failures propagate to the caller unless a retry
//!   budget is configured explicitly in `ClientOptions`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::error::DsnError;
use crate::feeds::dsn::model::{ConfigDocument, LiveSnapshot};
use crate::retrieve::ky_http::{ApiClient, ClientOptions};
use crate::utils::clock::Clock;

/// Public base URL of DSN Now.
pub const DEFAULT_BASE_URL: &str = "https://eyes.nasa.gov/dsn/";
/// Path of the configuration document, relative to the base URL.
pub const CONFIG_PATH: &str = "config.xml";
/// Path of the live-data document, relative to the base URL.
pub const LIVE_DATA_PATH: &str = "data/dsn.xml";
/// Width of a cache-busting bucket, in seconds.
pub const CACHE_BUCKET_SECS: u64 = 5;

/// Computes the cache-busting query value for a Unix timestamp.
///
/// ```
/// use lib_dsn::feeds::dsn::apicalldsn::cache_buster;
/// assert_eq!(cache_buster(1000), 200);
/// assert_eq!(cache_buster(1004), 200);
/// assert_eq!(cache_buster(1005), 201);
/// ```
pub fn cache_buster(unix_secs: u64) -> u64 {
    unix_secs / CACHE_BUCKET_SECS
}

/// A source of DSN documents.
///
/// The poller is generic over this trait so it can be driven by an
/// in-memory feed as easily as by the HTTP client.
pub trait DsnFeed: Send + Sync {
    /// Fetches and parses the configuration document.
    fn fetch_config(&self) -> impl Future<Output = Result<ConfigDocument, DsnError>> + Send;

    /// Fetches and parses one live-data snapshot.
    fn fetch_live_data(&self) -> impl Future<Output = Result<LiveSnapshot, DsnError>> + Send;
}

/// # DSN API Call Client
///
/// HTTP implementation of [`DsnFeed`] against DSN Now (or any server laid
/// out the same way under `base_url`).
pub struct ApiCallDsn {
    /// Absolute base URL the document paths are joined onto.
    base_url: String,
    /// Transport options used for every session.
    options: ClientOptions,
    /// Time source for the cache-busting parameter.
    clock: Arc<dyn Clock>,
}

impl ApiCallDsn {
    /// Creates a client for `base_url`.
    ///
    /// The URL is validated up front so a misconfiguration surfaces at
    /// startup rather than on the first poll.
    ///
    /// # Errors
    /// `InvalidUrl` if `base_url` is not an absolute URL.
    pub fn new(
        base_url: &str,
        options: ClientOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DsnError> {
        // Paths are joined relative to the base, which drops the last segment
        // unless the base ends with a slash.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        url::Url::parse(&base_url)?;

        Ok(Self {
            base_url,
            options,
            clock,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The cache-busting value a live-data request would use right now.
    pub fn current_cache_buster(&self) -> u64 {
        cache_buster(self.clock.now_unix_secs())
    }

    /// Opens a fresh session, issues one GET and returns the body.
    async fn fetch_xml(&self, path: &str, query: &[(&str, String)]) -> Result<String, DsnError> {
        let session = ApiClient::new(&self.base_url, &self.options)?;
        let url = session.url_for(path)?;
        let started = Instant::now();

        let response = session.get_text(path, query).await?;
        log::debug!(
            "GET {} {:?} -> {} in {:?}",
            url,
            query,
            response.status,
            started.elapsed()
        );
        response.into_body(url.as_str())
    }
}

impl DsnFeed for ApiCallDsn {
    async fn fetch_config(&self) -> Result<ConfigDocument, DsnError> {
        let body = self.fetch_xml(CONFIG_PATH, &[]).await?;
        let doc = ConfigDocument::from_xml(&body)?;
        log::info!("Fetched DSN configuration with {} spacecraft", doc.len());
        Ok(doc)
    }

    async fn fetch_live_data(&self) -> Result<LiveSnapshot, DsnError> {
        let r = self.current_cache_buster();
        let body = self.fetch_xml(LIVE_DATA_PATH, &[("r", r.to_string())]).await?;
        LiveSnapshot::from_xml(&body)
    }
}
