use anyhow::{Context, Result};
use clap::Parser;
use lib_dsn::ClientOptions;
use lib_dsn::feeds::dsn::apicalldsn::DEFAULT_BASE_URL;
use lib_dsn::ingestors::DEFAULT_POLL_INTERVAL;
use lib_dsn::retrieve::ky_http::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up when `--config-path` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dsn_poller.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "NASA Deep Space Network (DSN Now) uplink poller", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "DSN_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "DSN_BASE_URL", help = "Base URL of the DSN Now site (config.xml and data/dsn.xml live under it).")]
    pub base_url: Option<String>,

    #[clap(long, env = "DSN_POLL_INTERVAL_SECS", help = "Seconds between polls of the live-data feed.")]
    pub poll_interval_secs: Option<u64>,

    #[clap(long, env = "DSN_REQUEST_TIMEOUT_SECS", help = "Per-request HTTP timeout in seconds.")]
    pub request_timeout_secs: Option<u64>,

    #[clap(long, env = "DSN_MAX_RETRIES", help = "Retries on transient HTTP failures (0 disables retrying).")]
    pub max_retries: Option<u32>,

    #[clap(long, env = "DSN_USER_AGENT", help = "User-Agent header sent to DSN Now.")]
    pub user_agent: Option<String>,

    #[clap(long, env = "DSN_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "DSN_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "DSN_ONCE", num_args = 0..=1, default_missing_value = "true", help = "Run a single poll, print it as JSON and exit.")]
    pub once: Option<bool>,

    #[clap(long, env = "DSN_JSON", num_args = 0..=1, default_missing_value = "true", help = "Print every batch to stdout as a JSON line.")]
    pub json: Option<bool>,
}

impl Config {
    /// Built-in values, the lowest layer.
    pub fn defaults() -> Config {
        Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            poll_interval_secs: Some(DEFAULT_POLL_INTERVAL.as_secs()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
            max_retries: Some(0),
            user_agent: Some(ClientOptions::default().user_agent),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            once: Some(false),
            json: Some(false),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            base_url: other.base_url.or(self.base_url),
            poll_interval_secs: other.poll_interval_secs.or(self.poll_interval_secs),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
            user_agent: other.user_agent.or(self.user_agent),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            once: other.once.or(self.once),
            json: other.json.or(self.json),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn log_dir(&self) -> &Path {
        self.log_dir.as_deref().unwrap_or(Path::new("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn once(&self) -> bool {
        self.once.unwrap_or(false)
    }

    pub fn json(&self) -> bool {
        self.json.unwrap_or(false)
    }

    /// True when stdout carries JSON and must stay free of log lines.
    pub fn machine_output(&self) -> bool {
        self.once() || self.json()
    }

    /// HTTP settings for the feed client.
    pub fn client_options(&self) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            no_proxy: false,
        }
    }
}

/// Loads the configuration from the process arguments and environment.
pub fn load_config() -> Result<Config> {
    load_config_from(Config::parse())
}

/// Layers defaults, the JSON config file and `cli` (CLI flags and `DSN_*`
/// environment variables, already parsed) in that order.
///
/// A missing config file is not an error. An unreadable or invalid one is.
pub fn load_config_from(cli: Config) -> Result<Config> {
    // 1. Load defaults
    let mut current_config = Config::defaults();

    // 2. Load from config file (dsn_poller.conf) if present.
    let explicit_path = cli.config_path.is_some();
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_file_path.exists() {
        let config_str = fs::read_to_string(&config_file_path)
            .with_context(|| format!("Failed to read config file {}", config_file_path.display()))?;
        let file_config: Config = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", config_file_path.display()))?;
        current_config = current_config.merge(file_config);
    } else if explicit_path {
        anyhow::bail!("Config file not found at {}", config_file_path.display());
    }

    // 3. CLI arguments and environment variables win over the file.
    current_config = current_config.merge(cli);
    current_config.config_path = Some(config_file_path);

    anyhow::ensure!(
        current_config.poll_interval_secs != Some(0),
        "pollIntervalSecs must be greater than zero"
    );
    anyhow::ensure!(
        current_config.request_timeout_secs != Some(0),
        "requestTimeoutSecs must be greater than zero"
    );

    Ok(current_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Config {
        let mut argv = vec!["dsn_poller"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).expect("valid arguments")
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
        assert_eq!(cfg.client_options().timeout, Duration::from_secs(10));
        assert_eq!(cfg.client_options().max_retries, 0);
        assert_eq!(cfg.base_url(), "https://eyes.nasa.gov/dsn/");
        assert_eq!(cfg.log_dir(), Path::new("./logs"));
        assert!(!cfg.once());
        assert!(!cfg.json());
        assert!(!cfg.machine_output());
    }

    #[test]
    fn test_defaults_follow_library_constants() {
        let cfg = Config::defaults();
        assert_eq!(cfg.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(cfg.client_options().timeout, DEFAULT_TIMEOUT);
        assert_eq!(Config::default().poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_json_modes_are_machine_output() {
        assert!(cli(&["--once"]).machine_output());
        assert!(cli(&["--json"]).machine_output());
        assert!(!cli(&["--json", "false"]).machine_output());
    }

    #[test]
    fn test_file_overrides_defaults_and_cli_overrides_file() {
        let file = config_file(
            r#"{ "pollIntervalSecs": 30, "logLevel": "debug", "baseUrl": "http://localhost:8080/dsn/" }"#,
        );
        let path = file.path().to_str().unwrap();

        let cfg = load_config_from(cli(&["--config-path", path, "--poll-interval-secs", "5"])).unwrap();

        assert_eq!(cfg.poll_interval_secs, Some(5));
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.base_url(), "http://localhost:8080/dsn/");
        assert_eq!(cfg.request_timeout_secs, Some(10));
    }

    #[test]
    fn test_boolean_flags() {
        assert_eq!(cli(&["--once"]).once, Some(true));
        assert_eq!(cli(&["--json", "false"]).json, Some(false));
        assert_eq!(cli(&[]).once, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let file = config_file("{ not json");
        let path = file.path().to_str().unwrap();
        assert!(load_config_from(cli(&["--config-path", path])).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.conf");
        assert!(load_config_from(cli(&["--config-path", path.to_str().unwrap()])).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let file = config_file(r#"{ "pollIntervalSecs": 0 }"#);
        let path = file.path().to_str().unwrap();
        assert!(load_config_from(cli(&["--config-path", path])).is_err());
    }

    #[test]
    fn test_client_options_follow_config() {
        let cfg = Config {
            request_timeout_secs: Some(3),
            max_retries: Some(2),
            user_agent: Some("probe/1.0".into()),
            ..Config::defaults()
        };
        let opts = cfg.client_options();
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.max_retries, 2);
        assert_eq!(opts.user_agent, "probe/1.0");
    }
}
