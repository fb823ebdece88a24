//! # DSN Polling Ingestor
//!
//! A timer-driven ingestor for the DSN Now feed, which only offers
//! request/response documents and no streaming interface.
//!
//! ## Key Design Principles:
//! - **Fixed cadence**: `run` drives polls from a `tokio::time::interval`
//!   (60 s by default). A poll always completes or fails before the next one
//!   starts; late ticks are delayed, never bunched up.
//! - **Lazy configuration**: the spacecraft table is fetched on the first poll
//!   and kept for the lifetime of the poller. If that fetch fails the poll
//!   fails and the next poll tries again.
//! - **Per-record tolerance**: a signal with an unknown spacecraft or a
//!   missing/non-numeric reading is logged and skipped. The rest of the batch
//!   is still emitted.
//! - **Outermost recovery boundary**: network and parse errors end the current
//!   poll only. `run` logs them, flags the last good batch as stale, and
//!   carries on at the next tick. It returns only when the shutdown token is
//!   cancelled, which is checked between ticks and never interrupts a fetch.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::core::dispatcher::ObservationSink;
use crate::core::observation::{MetricKind, Observation};
use crate::error::DsnError;
use crate::feeds::dsn::apicalldsn::DsnFeed;
use crate::feeds::dsn::model::{DishRecord, LiveSnapshot, SignalRecord};
use crate::feeds::dsn::spacecraft::SpacecraftFinder;

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Shortest interval `run` accepts; shorter values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// # Poll Statistics
///
/// Counters describing the poller's history, mainly for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Polls that produced a batch.
    pub succeeded: u64,
    /// Polls that failed with a network or parse error.
    pub failed: u64,
    /// Signals skipped because of record-level errors, across all polls.
    pub skipped_signals: u64,
}

/// # DSN Polling Plugin
///
/// Owns the feed and the spacecraft name cache. Both `poll_once` and `run`
/// take `&mut self`, so a single poller can never run two polls at once.
pub struct DsnPollingPlugin<F: DsnFeed> {
    /// Source of configuration and live-data documents.
    feed: F,
    /// Name resolver, created from the first successfully fetched configuration.
    finder: Option<SpacecraftFinder>,
    /// When the last successful poll finished.
    last_success: Option<Instant>,
    /// Running counters.
    stats: PollStats,
}

impl<F: DsnFeed> DsnPollingPlugin<F> {
    /// Creates a poller over `feed`. Nothing is fetched until the first poll.
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            finder: None,
            last_success: None,
            stats: PollStats::default(),
        }
    }

    /// The underlying feed.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// The name resolver, once the configuration has been fetched.
    pub fn finder(&self) -> Option<&SpacecraftFinder> {
        self.finder.as_ref()
    }

    /// Counters so far.
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// Age of the last successful batch, `None` before the first success.
    pub fn last_success_age(&self) -> Option<Duration> {
        self.last_success.map(|t| t.elapsed())
    }

    /// # Poll Once
    ///
    /// Fetches one live snapshot and turns it into observations.
    ///
    /// For every up-signal of every dish that has a numeric power and
    /// frequency and a known spacecraft, one `Power` and one `Frequency`
    /// observation are emitted, in feed order.
    ///
    /// # Errors
    /// `Network` or `Parse` from the configuration or live-data fetch.
    /// Record-level problems never surface here.
    pub async fn poll_once(&mut self) -> Result<Vec<Observation>, DsnError> {
        let result = self.poll_inner().await;
        match &result {
            Ok(_) => {
                self.stats.succeeded += 1;
                self.last_success = Some(Instant::now());
            }
            Err(_) => self.stats.failed += 1,
        }
        result
    }

    async fn poll_inner(&mut self) -> Result<Vec<Observation>, DsnError> {
        let finder = match self.finder.take() {
            Some(finder) => finder,
            None => {
                let config = self.feed.fetch_config().await?;
                if config.is_empty() {
                    log::warn!("DSN configuration lists no spacecraft; every signal will be skipped.");
                }
                SpacecraftFinder::new(config)
            }
        };
        let finder = self.finder.insert(finder);

        let snapshot = self.feed.fetch_live_data().await?;
        let (observations, skipped) = extract_observations(&snapshot, finder);
        self.stats.skipped_signals += skipped as u64;

        log::debug!(
            "Polled {} dishes / {} signals -> {} observations ({} skipped)",
            snapshot.dishes.len(),
            snapshot.signal_count(),
            observations.len(),
            skipped
        );
        Ok(observations)
    }

    /// # Main Execution Loop
    ///
    /// Polls every `interval` and hands each batch to `sink` until `shutdown`
    /// is cancelled.
    ///
    /// ## Workflow:
    /// 1.  Wait for the next tick, or return if `shutdown` fires first. The
    ///     first tick is immediate.
    /// 2.  Run `poll_once` to completion.
    /// 3.  **On Success**: deliver the batch to `sink`.
    /// 4.  **On Error**: log it along with the age of the last good batch,
    ///     which consumers should now treat as stale, and wait for the next tick.
    ///
    /// An `interval` below `MIN_POLL_INTERVAL` (including zero) is raised to it.
    pub async fn run<S: ObservationSink>(
        &mut self,
        interval: Duration,
        sink: &mut S,
        shutdown: CancellationToken,
    ) {
        let interval = interval.max(MIN_POLL_INTERVAL);
        log::info!("DSN polling started (interval {:?}).", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.poll_once().await {
                Ok(batch) => {
                    log::info!("DSN poll produced {} observations.", batch.len());
                    sink.deliver(batch);
                }
                Err(e) => match self.last_success_age() {
                    Some(age) => log::error!(
                        "DSN polling error: {}. Last good observations are {}s old and now stale; retrying in {:?}.",
                        e,
                        age.as_secs(),
                        interval
                    ),
                    None => log::error!(
                        "DSN polling error: {}. No observations yet; retrying in {:?}.",
                        e,
                        interval
                    ),
                },
            }
        }

        log::info!(
            "DSN polling stopped after {} successful and {} failed polls.",
            self.stats.succeeded,
            self.stats.failed
        );
    }
}

/// Parses one reading of a signal.
fn parse_reading(field: &'static str, raw: Option<&str>) -> Result<f64, DsnError> {
    let malformed = || DsnError::MalformedSignal {
        field,
        value: raw.map(str::to_string),
    };
    let value: f64 = raw.ok_or_else(malformed)?.trim().parse().map_err(|_| malformed())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed())
    }
}

/// Converts one signal into its power and frequency observations.
fn signal_observations(
    dish: &DishRecord,
    signal: &SignalRecord,
    finder: &mut SpacecraftFinder,
) -> Result<[Observation; 2], DsnError> {
    let power = parse_reading("power", signal.power.as_deref())?;
    let frequency = parse_reading("frequency", signal.frequency.as_deref())?;
    let code = signal
        .spacecraft
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(DsnError::MalformedSignal { field: "spacecraft", value: None })?;
    let device = finder.resolve(code)?;

    Ok([
        Observation::new(device.clone(), dish.name.clone(), MetricKind::Power, power),
        Observation::new(device, dish.name.clone(), MetricKind::Frequency, frequency),
    ])
}

/// Walks a snapshot and builds its observations.
///
/// Returns the observations and the number of signals skipped because of
/// record-level errors.
pub fn extract_observations(
    snapshot: &LiveSnapshot,
    finder: &mut SpacecraftFinder,
) -> (Vec<Observation>, usize) {
    let mut observations = Vec::with_capacity(snapshot.signal_count() * 2);
    let mut skipped = 0;

    for dish in &snapshot.dishes {
        for target in &dish.targets {
            log::debug!(
                "Dish {} tracking target {} (id {})",
                dish.name,
                target.name.as_deref().unwrap_or("?"),
                target.id.as_deref().unwrap_or("?")
            );
        }

        for signal in &dish.up_signals {
            match signal_observations(dish, signal, finder) {
                Ok(pair) => observations.extend(pair),
                Err(e) => {
                    skipped += 1;
                    log::warn!("Skipping up-signal on dish {}: {}", dish.name, e);
                }
            }
        }
    }

    (observations, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::dsn::model::{ConfigDocument, SpacecraftEntry};

    fn finder() -> SpacecraftFinder {
        SpacecraftFinder::new(ConfigDocument::new(vec![SpacecraftEntry {
            code: "vgr1".into(),
            friendly_name: "Voyager 1".into(),
        }]))
    }

    fn signal(power: &str, frequency: &str, spacecraft: &str) -> SignalRecord {
        SignalRecord {
            power: Some(power.into()),
            frequency: Some(frequency.into()),
            spacecraft: Some(spacecraft.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_reading_accepts_numbers() {
        assert_eq!(parse_reading("power", Some("2.5")).unwrap(), 2.5);
        assert_eq!(parse_reading("power", Some(" 18 ")).unwrap(), 18.0);
        assert_eq!(parse_reading("frequency", Some("1e9")).unwrap(), 1e9);
    }

    #[test]
    fn test_parse_reading_rejects_garbage() {
        for raw in [None, Some(""), Some("abc"), Some("NaN"), Some("inf")] {
            assert!(matches!(
                parse_reading("power", raw),
                Err(DsnError::MalformedSignal { field: "power", .. })
            ));
        }
    }

    #[test]
    fn test_frequency_observation_carries_frequency() {
        let snapshot = LiveSnapshot {
            dishes: vec![DishRecord {
                name: "DSS14".into(),
                targets: Vec::new(),
                up_signals: vec![signal("2.5", "1000000000", "vgr1")],
            }],
            timestamp_ms: None,
        };
        let (obs, skipped) = extract_observations(&snapshot, &mut finder());
        assert_eq!(skipped, 0);
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].metric, MetricKind::Power);
        assert_eq!(obs[0].value, 2.5);
        assert_eq!(obs[1].metric, MetricKind::Frequency);
        assert_eq!(obs[1].value, 1_000_000_000.0);
    }

    #[test]
    fn test_bad_records_are_skipped_not_fatal() {
        let snapshot = LiveSnapshot {
            dishes: vec![DishRecord {
                name: "DSS43".into(),
                targets: Vec::new(),
                up_signals: vec![
                    signal("abc", "1", "vgr1"),
                    signal("1", "2", "nope"),
                    SignalRecord { spacecraft: Some("vgr1".into()), ..Default::default() },
                    signal("3", "4", ""),
                    signal("5", "6", "VGR1"),
                ],
            }],
            timestamp_ms: None,
        };
        let (obs, skipped) = extract_observations(&snapshot, &mut finder());
        assert_eq!(skipped, 4);
        assert_eq!(obs.len(), 2);
        assert!(obs.iter().all(|o| o.device_name == "Voyager 1" && o.dish == "DSS43"));
    }
}
