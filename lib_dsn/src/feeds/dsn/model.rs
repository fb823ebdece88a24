//! # DSN Feed Data Models
//!
//! Strongly-typed views over the two DSN Now documents:
//!
//! - **`config.xml`** → [`ConfigDocument`]: the spacecraft code table
//!   (`config.spacecraftMap.spacecraft[]`, attributes `name` and `friendlyName`).
//! - **`dsn.xml`** → [`LiveSnapshot`]: dishes (`dsn.dish[]`), each with its
//!   targets and up-signals.
//!
//! Both are built from the nested mapping produced by `xml_map::parse`.
//! Repeatable children (`spacecraft`, `dish`, `target`, `upSignal`) go through
//! `xml_map::as_sequence` here, so nothing downstream ever has to care
//! whether the XML held one child or many.
//!
//! Signal readings are kept as the raw attribute strings; turning them into
//! numbers is a per-record decision made by the poller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::xml_map::{self, as_sequence, attr, child_text};
use crate::error::DsnError;

/// One row of the spacecraft code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacecraftEntry {
    /// Short code used by the live feed (lowercase upstream, e.g. `vgr1`).
    pub code: String,
    /// Human-readable name (e.g. `Voyager 1`).
    pub friendly_name: String,
}

/// The parsed configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Every spacecraft listed in `config.spacecraftMap`.
    pub spacecraft: Vec<SpacecraftEntry>,
}

impl ConfigDocument {
    /// Builds a document directly from entries.
    pub fn new(spacecraft: Vec<SpacecraftEntry>) -> Self {
        Self { spacecraft }
    }

    /// Parses the raw `config.xml` body.
    pub fn from_xml(xml: &str) -> Result<Self, DsnError> {
        Self::from_value(&xml_map::parse(xml)?)
    }

    /// Builds the document from its mapping form.
    ///
    /// # Errors
    /// `Parse` when `config` or `config.spacecraftMap` is missing. Entries
    /// without a `name` or `friendlyName` attribute are skipped.
    pub fn from_value(doc: &Value) -> Result<Self, DsnError> {
        let config = doc
            .get("config")
            .ok_or_else(|| DsnError::Parse("missing <config> root element".into()))?;
        let map = config
            .get("spacecraftMap")
            .ok_or_else(|| DsnError::Parse("missing <spacecraftMap> in configuration".into()))?;

        let mut spacecraft = Vec::new();
        for entry in as_sequence(map.get("spacecraft")) {
            match (attr(entry, "name"), attr(entry, "friendlyName")) {
                (Some(code), Some(friendly_name)) => spacecraft.push(SpacecraftEntry {
                    code: code.to_string(),
                    friendly_name: friendly_name.to_string(),
                }),
                _ => log::debug!("Skipping incomplete spacecraft entry: {}", entry),
            }
        }

        Ok(Self { spacecraft })
    }

    /// Number of spacecraft entries.
    pub fn len(&self) -> usize {
        self.spacecraft.len()
    }

    /// True when the document lists no spacecraft.
    pub fn is_empty(&self) -> bool {
        self.spacecraft.is_empty()
    }
}

/// A target a dish is currently pointed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Numeric target id as published.
    pub id: Option<String>,
    /// Spacecraft code of the target.
    pub name: Option<String>,
}

/// One up-signal (uplink) entry of a dish. Readings are raw attribute values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Spacecraft code the signal is sent to.
    pub spacecraft: Option<String>,
    /// Transmit power in kilowatts.
    pub power: Option<String>,
    /// Carrier frequency in hertz.
    pub frequency: Option<String>,
    /// `data`, `carrier` or `none`.
    pub signal_type: Option<String>,
    /// Data rate in bits per second.
    pub data_rate: Option<String>,
    /// Frequency band (`S`, `X`, `Ka`).
    pub band: Option<String>,
}

/// One antenna of the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    /// Dish name (e.g. `DSS14`).
    pub name: String,
    /// Targets, always a sequence regardless of how many the XML held.
    pub targets: Vec<TargetRecord>,
    /// Up-signals, always a sequence regardless of how many the XML held.
    pub up_signals: Vec<SignalRecord>,
}

/// The parsed live-data document of one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// All dishes, in feed order.
    pub dishes: Vec<DishRecord>,
    /// Upstream timestamp in milliseconds since the epoch, if published.
    pub timestamp_ms: Option<u64>,
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

impl TargetRecord {
    fn from_value(value: &Value) -> Self {
        Self {
            id: owned(attr(value, "id")),
            name: owned(attr(value, "name")),
        }
    }
}

impl SignalRecord {
    fn from_value(value: &Value) -> Self {
        Self {
            spacecraft: owned(attr(value, "spacecraft")),
            power: owned(attr(value, "power")),
            frequency: owned(attr(value, "frequency")),
            signal_type: owned(attr(value, "signalType")),
            data_rate: owned(attr(value, "dataRate")),
            band: owned(attr(value, "band")),
        }
    }
}

impl DishRecord {
    fn from_value(value: &Value) -> Self {
        Self {
            name: attr(value, "name").unwrap_or_default().to_string(),
            targets: as_sequence(value.get("target"))
                .into_iter()
                .filter(|v| v.is_object())
                .map(TargetRecord::from_value)
                .collect(),
            up_signals: as_sequence(value.get("upSignal"))
                .into_iter()
                .filter(|v| v.is_object())
                .map(SignalRecord::from_value)
                .collect(),
        }
    }
}

impl LiveSnapshot {
    /// Parses the raw `dsn.xml` body.
    pub fn from_xml(xml: &str) -> Result<Self, DsnError> {
        Self::from_value(&xml_map::parse(xml)?)
    }

    /// Builds the snapshot from its mapping form.
    ///
    /// # Errors
    /// `Parse` when the `dsn` root element is missing. A `dsn` element with
    /// no dishes is a valid, empty snapshot.
    pub fn from_value(doc: &Value) -> Result<Self, DsnError> {
        let dsn = doc
            .get("dsn")
            .ok_or_else(|| DsnError::Parse("missing <dsn> root element".into()))?;

        let dishes = as_sequence(dsn.get("dish"))
            .into_iter()
            .filter(|v| v.is_object())
            .map(DishRecord::from_value)
            .collect();

        let timestamp_ms = child_text(dsn, "timestamp").and_then(|t| t.parse().ok());

        Ok(Self { dishes, timestamp_ms })
    }

    /// Total number of up-signals across all dishes.
    pub fn signal_count(&self) -> usize {
        self.dishes.iter().map(|d| d.up_signals.len()).sum()
    }
}
