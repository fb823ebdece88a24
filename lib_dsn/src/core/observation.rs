//! # Observations
//!
//! The unit of output of the poller: one metric reading attributed to one
//! spacecraft during one poll cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What an observation measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Uplink transmit power.
    Power,
    /// Uplink carrier frequency.
    Frequency,
}

impl MetricKind {
    /// The unit readings of this kind are expressed in.
    pub fn unit(self) -> Unit {
        match self {
            MetricKind::Power => Unit::Kilowatt,
            MetricKind::Frequency => Unit::Hertz,
        }
    }

    /// Lowercase name used in sensor names and keys.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Power => "power",
            MetricKind::Frequency => "frequency",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of measurement of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Kilowatts.
    #[serde(rename = "kW")]
    Kilowatt,
    /// Hertz.
    #[serde(rename = "Hz")]
    Hertz,
}

impl Unit {
    /// The conventional symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Kilowatt => "kW",
            Unit::Hertz => "Hz",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One emitted metric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Friendly name of the spacecraft (the device identity).
    pub device_name: String,
    /// Dish that carried the signal.
    pub dish: String,
    /// What was measured.
    pub metric: MetricKind,
    /// The reading.
    pub value: f64,
    /// Unit of `value`, always `metric.unit()`.
    pub unit: Unit,
}

impl Observation {
    /// Creates an observation; the unit follows from the metric.
    pub fn new(device_name: impl Into<String>, dish: impl Into<String>, metric: MetricKind, value: f64) -> Self {
        Self {
            device_name: device_name.into(),
            dish: dish.into(),
            metric,
            value,
            unit: metric.unit(),
        }
    }

    /// Display name of the sensor, e.g. `Voyager 1 up power`.
    pub fn sensor_name(&self) -> String {
        format!("{} up {}", self.device_name, self.metric)
    }

    /// Stable key for the (device, metric) pair, e.g. `Voyager 1_power`.
    pub fn unique_key(&self) -> String {
        format!("{}_{}", self.device_name, self.metric)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} {} ({})", self.sensor_name(), self.value, self.unit, self.dish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_follows_metric() {
        let p = Observation::new("Voyager 1", "DSS14", MetricKind::Power, 2.5);
        let f = Observation::new("Voyager 1", "DSS14", MetricKind::Frequency, 1e9);
        assert_eq!(p.unit, Unit::Kilowatt);
        assert_eq!(f.unit, Unit::Hertz);
    }

    #[test]
    fn test_names_and_display() {
        let p = Observation::new("Voyager 1", "DSS14", MetricKind::Power, 2.5);
        assert_eq!(p.sensor_name(), "Voyager 1 up power");
        assert_eq!(p.unique_key(), "Voyager 1_power");
        assert_eq!(p.to_string(), "Voyager 1 up power = 2.5 kW (DSS14)");
    }

    #[test]
    fn test_json_shape() {
        let f = Observation::new("Voyager 1", "DSS14", MetricKind::Frequency, 1000.0);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["metric"], "frequency");
        assert_eq!(v["unit"], "Hz");
        assert_eq!(v["device_name"], "Voyager 1");
    }
}
