//! # `ApiCallDsn` Integration Tests
//!
//! Exercises the HTTP feed client against a throwaway HTTP server bound to a
//! random local port. The server answers each accepted connection with the
//! next canned response and records the request line it received, which lets
//! the tests check paths and the cache-busting query.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use lib_dsn::feeds::dsn::apicalldsn::{ApiCallDsn, DsnFeed};
use lib_dsn::ingestors::DsnPollingPlugin;
use lib_dsn::retrieve::ClientOptions;
use lib_dsn::utils::clock::FixedClock;
use lib_dsn::{DsnError, MetricKind, Unit};

const CONFIG_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<config>
  <spacecraftMap>
    <spacecraft name="vgr1" explorerName="sc_voyager_1" friendlyName="Voyager 1"/>
    <spacecraft name="mro" explorerName="sc_mro" friendlyName="Mars Reconnaissance Orbiter"/>
  </spacecraftMap>
</config>"#;

const LIVE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<dsn>
  <station name="mdscc" friendlyName="Madrid" timeUTC="1700000000000" timeZoneOffset="3600000"/>
  <dish name="DSS63" azimuthAngle="120.5" elevationAngle="30.1" windSpeed="5" isMSPA="false" isArray="false" isDDOR="false" activity="Spacecraft Telemetry">
    <upSignal signalType="data" dataRate="2000" frequency="1000000000" band="X" power="2.5" spacecraft="VGR1" spacecraftID="-31"/>
    <target name="VGR1" id="31" uplegRange="2.4e10" downlegRange="2.4e10" rtlt="160000"/>
  </dish>
  <timestamp>1700000000000</timestamp>
</dsn>"#;

/// A canned HTTP server serving one response per connection.
struct MockServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else { return };

                // Read until the end of the request headers.
                let mut raw = Vec::new();
                let mut buf = [0u8; 1024];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => raw.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&raw);
                let request_line = request.lines().next().unwrap_or_default().to_string();
                seen.lock().unwrap().push(request_line);

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/xml\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/dsn/", port),
            requests,
            handle,
        }
    }

    fn finish(self) -> Vec<String> {
        self.handle.join().unwrap();
        let requests = self.requests.lock().unwrap().clone();
        requests
    }
}

fn client(base_url: &str, clock: Arc<FixedClock>) -> ApiCallDsn {
    let options = ClientOptions {
        no_proxy: true,
        ..ClientOptions::default()
    };
    ApiCallDsn::new(base_url, options, clock).expect("valid base url")
}

#[tokio::test]
async fn test_fetch_config_parses_spacecraft_map() {
    let server = MockServer::start(vec![(200, CONFIG_XML)]);
    let feed = client(&server.base_url, Arc::new(FixedClock::new(0)));

    let doc = feed.fetch_config().await.expect("config should parse");
    let requests = server.finish();

    assert_eq!(doc.len(), 2);
    assert_eq!(doc.spacecraft[0].code, "vgr1");
    assert_eq!(doc.spacecraft[1].friendly_name, "Mars Reconnaissance Orbiter");
    assert_eq!(requests, vec!["GET /dsn/config.xml HTTP/1.1".to_string()]);
}

#[tokio::test]
async fn test_fetch_live_data_sends_cache_buster() {
    let server = MockServer::start(vec![(200, LIVE_XML), (200, LIVE_XML), (200, LIVE_XML)]);
    let clock = Arc::new(FixedClock::new(1000));
    let feed = client(&server.base_url, Arc::clone(&clock));

    let snapshot = feed.fetch_live_data().await.expect("live data should parse");
    clock.set(1004);
    feed.fetch_live_data().await.expect("second fetch");
    clock.set(1005);
    feed.fetch_live_data().await.expect("third fetch");
    let requests = server.finish();

    assert_eq!(snapshot.dishes.len(), 1);
    assert_eq!(snapshot.dishes[0].name, "DSS63");
    assert_eq!(snapshot.timestamp_ms, Some(1_700_000_000_000));
    assert_eq!(
        requests,
        vec![
            "GET /dsn/data/dsn.xml?r=200 HTTP/1.1".to_string(),
            "GET /dsn/data/dsn.xml?r=200 HTTP/1.1".to_string(),
            "GET /dsn/data/dsn.xml?r=201 HTTP/1.1".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_http_error_status_is_network_error() {
    let server = MockServer::start(vec![(503, "maintenance")]);
    let feed = client(&server.base_url, Arc::new(FixedClock::new(0)));

    let result = feed.fetch_live_data().await;
    let requests = server.finish();

    match result {
        Err(DsnError::Network(msg)) => assert!(msg.contains("503"), "message: {}", msg),
        other => panic!("expected Network error, got {:?}", other),
    }
    // No retries unless configured.
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start(vec![(200, "<dsn><dish name=\"DSS14\"></dsn>")]);
    let feed = client(&server.base_url, Arc::new(FixedClock::new(0)));

    let result = feed.fetch_live_data().await;
    server.finish();

    assert!(matches!(result, Err(DsnError::Parse(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port, then close it so nothing is listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let feed = client(&format!("http://127.0.0.1:{}/", port), Arc::new(FixedClock::new(0)));

    let result = feed.fetch_config().await;
    assert!(matches!(result, Err(DsnError::Network(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_poller_end_to_end_over_http() {
    let server = MockServer::start(vec![(200, CONFIG_XML), (200, LIVE_XML), (200, LIVE_XML)]);
    let feed = client(&server.base_url, Arc::new(FixedClock::new(1000)));
    let mut poller = DsnPollingPlugin::new(feed);

    let first = poller.poll_once().await.expect("first poll");
    let second = poller.poll_once().await.expect("second poll");
    let requests = server.finish();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].device_name, "Voyager 1");
    assert_eq!(first[0].metric, MetricKind::Power);
    assert_eq!(first[0].value, 2.5);
    assert_eq!(first[0].unit, Unit::Kilowatt);
    assert_eq!(first[1].metric, MetricKind::Frequency);
    assert_eq!(first[1].value, 1_000_000_000.0);
    assert_eq!(first[1].unit, Unit::Hertz);

    // Configuration once, live data per poll.
    assert_eq!(requests.len(), 3);
    assert!(requests[0].contains("/dsn/config.xml"));
    assert!(requests[1].contains("/dsn/data/dsn.xml?r=200"));
    assert_eq!(poller.finder().unwrap().scan_count(), 1);
}
