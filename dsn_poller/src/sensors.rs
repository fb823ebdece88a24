use lib_dsn::core::ObservationFrame;
use lib_dsn::{Observation, Unit};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Latest state of one (spacecraft, metric) sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    pub name: String,
    pub device: String,
    pub dish: String,
    pub value: f64,
    pub unit: Unit,
    /// Batch that last updated this sensor.
    pub seq: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub added: usize,
    pub updated: usize,
}

/// Sensors keyed by `Observation::unique_key`, one per spacecraft and metric.
///
/// A sensor is created the first time its spacecraft shows up and then keeps
/// the last reading it was given, also across polls where the spacecraft is
/// not being tracked.
#[derive(Debug, Default)]
pub struct SensorBoard {
    sensors: BTreeMap<String, SensorState>,
}

impl SensorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, seq: u64, observations: &[Observation]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for obs in observations {
            let state = SensorState {
                name: obs.sensor_name(),
                device: obs.device_name.clone(),
                dish: obs.dish.clone(),
                value: obs.value,
                unit: obs.unit,
                seq,
            };
            match self.sensors.insert(obs.unique_key(), state) {
                Some(_) => outcome.updated += 1,
                None => {
                    outcome.added += 1;
                    log::info!("New sensor '{}' ({})", obs.sensor_name(), obs.unit);
                }
            }
        }
        outcome
    }

    pub fn get(&self, unique_key: &str) -> Option<&SensorState> {
        self.sensors.get(unique_key)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Distinct spacecraft with at least one sensor.
    pub fn devices(&self) -> BTreeSet<&str> {
        self.sensors.values().map(|s| s.device.as_str()).collect()
    }
}

/// Keeps a `SensorBoard` up to date from dispatcher frames and logs each batch.
pub async fn track(mut rx: mpsc::UnboundedReceiver<Arc<ObservationFrame>>) -> SensorBoard {
    let mut board = SensorBoard::new();
    while let Some(frame) = rx.recv().await {
        let outcome = board.apply(frame.seq, &frame.observations);
        log::info!(
            "Batch #{}: {} observations ({} new, {} updated), {} sensors across {} spacecraft",
            frame.seq,
            frame.observations.len(),
            outcome.added,
            outcome.updated,
            board.len(),
            board.devices().len()
        );
        for obs in &frame.observations {
            if let Some(sensor) = board.get(&obs.unique_key()) {
                log::debug!(
                    "{} = {} {} (dish {}, batch #{})",
                    sensor.name,
                    sensor.value,
                    sensor.unit,
                    sensor.dish,
                    sensor.seq
                );
            }
        }
    }
    board
}

/// Prints every frame to stdout as one JSON line.
pub async fn print_json(mut rx: mpsc::UnboundedReceiver<Arc<ObservationFrame>>) {
    while let Some(frame) = rx.recv().await {
        match frame_json(frame.seq, &frame.observations) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to serialize batch #{}: {}", frame.seq, e),
        }
    }
}

pub fn frame_json(seq: u64, observations: &[Observation]) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "seq": seq,
        "observations": observations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_dsn::{Dispatcher, MetricKind};

    fn voyager(power: f64) -> Vec<Observation> {
        vec![
            Observation::new("Voyager 1", "DSS14", MetricKind::Power, power),
            Observation::new("Voyager 1", "DSS14", MetricKind::Frequency, 1e9),
        ]
    }

    #[test]
    fn test_first_batch_adds_then_updates() {
        let mut board = SensorBoard::new();
        assert_eq!(board.apply(1, &voyager(2.5)), ApplyOutcome { added: 2, updated: 0 });
        assert_eq!(board.apply(2, &voyager(3.0)), ApplyOutcome { added: 0, updated: 2 });

        let power = board.get("Voyager 1_power").unwrap();
        assert_eq!(power.name, "Voyager 1 up power");
        assert_eq!(power.value, 3.0);
        assert_eq!(power.unit, Unit::Kilowatt);
        assert_eq!(power.seq, 2);
        assert_eq!(board.get("Voyager 1_frequency").unwrap().unit, Unit::Hertz);
        assert_eq!(board.devices().into_iter().collect::<Vec<_>>(), vec!["Voyager 1"]);
    }

    #[test]
    fn test_sensors_survive_empty_batches() {
        let mut board = SensorBoard::new();
        board.apply(1, &voyager(2.5));
        assert_eq!(board.apply(2, &[]), ApplyOutcome::default());
        assert_eq!(board.len(), 2);
        assert_eq!(board.get("Voyager 1_power").unwrap().seq, 1);
    }

    #[test]
    fn test_frame_json_shape() {
        let line = frame_json(7, &voyager(2.5)).unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["seq"], 7);
        assert_eq!(v["observations"][0]["device_name"], "Voyager 1");
        assert_eq!(v["observations"][0]["metric"], "power");
        assert_eq!(v["observations"][0]["unit"], "kW");
        assert_eq!(v["observations"][1]["unit"], "Hz");
    }

    #[tokio::test]
    async fn test_track_consumes_dispatcher_frames() {
        let dispatcher = Dispatcher::new();
        let rx = dispatcher.add_client("sensors");
        dispatcher.broadcast(voyager(2.5));
        dispatcher.broadcast(voyager(4.0));
        drop(dispatcher);

        let board = track(rx).await;
        assert_eq!(board.len(), 2);
        assert_eq!(board.get("Voyager 1_power").unwrap().value, 4.0);
        assert_eq!(board.get("Voyager 1_power").unwrap().seq, 2);
    }
}
