// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for the analyzer service.
///
/// Every section is optional; anything left out falls back to the built-in
/// defaults in [`crate::config::consts`]. It is typically loaded from a YAML
/// file and then adjusted by environment variables and command line flags.
///
/// # Example
/// ```yaml
/// server:
///   host: 0.0.0.0
///   port: 8000
/// engine:
///   path: stockfish
///   search_paths: [/usr/games]
///   pool_size: 2
///   options:
///     Threads: "1"
///     Hash: "32"
/// analysis:
///   default_depth: 12
///   default_multipv: 2
///   default_time_sec: 0.05
/// logging:
///   format: json
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How engine processes are launched and pooled.
///
/// # Fields
/// * `path` - Engine executable, either a path or a name looked up on PATH
/// * `args` - Extra command line arguments for the engine
/// * `search_paths` - Directories prepended to the engine's PATH
/// * `pool_size` - Maximum number of engine processes alive at once
/// * `prewarm` - Start one engine at boot instead of on the first request
/// * `options` - UCI options sent with `setoption` after the handshake
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub path: String,
    pub args: Vec<String>,
    pub search_paths: Vec<PathBuf>,
    pub pool_size: usize,
    pub prewarm: bool,
    pub startup_timeout_ms: u64,
    pub response_grace_ms: u64,
    pub checkout_timeout_ms: u64,
    pub ping_timeout_ms: u64,
    pub quit_timeout_ms: u64,
    pub options: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_ENGINE_PATH.to_string(),
            args: Vec::new(),
            search_paths: vec![PathBuf::from(DEFAULT_ENGINE_SEARCH_PATH)],
            pool_size: DEFAULT_POOL_SIZE,
            prewarm: true,
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            response_grace_ms: DEFAULT_RESPONSE_GRACE_MS,
            checkout_timeout_ms: DEFAULT_CHECKOUT_TIMEOUT_MS,
            ping_timeout_ms: DEFAULT_PING_TIMEOUT_MS,
            quit_timeout_ms: DEFAULT_QUIT_TIMEOUT_MS,
            options: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn response_grace(&self) -> Duration {
        Duration::from_millis(self.response_grace_ms)
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_millis(self.checkout_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_millis(self.quit_timeout_ms)
    }
}

/// Defaults and hard limits for analysis requests.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub default_depth: u32,
    pub default_multipv: u32,
    pub default_time_sec: f64,
    pub max_depth: u32,
    pub max_multipv: u32,
    pub max_time_sec: f64,
    pub max_plies: usize,
    pub key_moments: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_depth: DEFAULT_DEPTH,
            default_multipv: DEFAULT_MULTIPV,
            default_time_sec: DEFAULT_TIME_SEC,
            max_depth: MAX_DEPTH,
            max_multipv: MAX_MULTIPV,
            max_time_sec: MAX_TIME_SEC,
            max_plies: MAX_PLIES,
            key_moments: DEFAULT_KEY_MOMENTS,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `filter` when set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Apply `ANALYZER_*` overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = parse_override(ENV_PORT, &port)?;
        }
        if let Some(path) = lookup(ENV_ENGINE_PATH) {
            self.engine.path = path;
        }
        if let Some(size) = lookup(ENV_POOL_SIZE) {
            self.engine.pool_size = parse_override(ENV_POOL_SIZE, &size)?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = parse_override(ENV_LOG_FORMAT, &format)?;
        }
        Ok(())
    }

    /// Check ranges that serde cannot express. All problems are reported together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.server.host.trim().is_empty() {
            problems.push("server.host must not be empty".to_string());
        }
        if self.server.body_limit_bytes == 0 {
            problems.push("server.body_limit_bytes must be greater than 0".to_string());
        }
        if self.engine.path.trim().is_empty() {
            problems.push("engine.path must not be empty".to_string());
        }
        if self.engine.pool_size == 0 {
            problems.push("engine.pool_size must be at least 1".to_string());
        }
        if self.engine.startup_timeout_ms == 0 || self.engine.checkout_timeout_ms == 0 {
            problems.push("engine timeouts must be greater than 0".to_string());
        }

        let analysis = &self.analysis;
        if analysis.max_depth == 0 {
            problems.push("analysis.max_depth must be at least 1".to_string());
        }
        if !(1..=MAX_MULTIPV).contains(&analysis.max_multipv) {
            problems.push(format!(
                "analysis.max_multipv must be between 1 and {MAX_MULTIPV}"
            ));
        }
        if analysis.default_depth == 0 || analysis.default_depth > analysis.max_depth {
            problems.push("analysis.default_depth must be between 1 and max_depth".to_string());
        }
        if analysis.default_multipv == 0 || analysis.default_multipv > analysis.max_multipv {
            problems
                .push("analysis.default_multipv must be between 1 and max_multipv".to_string());
        }
        if !analysis.max_time_sec.is_finite() || analysis.max_time_sec <= 0.0 {
            problems.push("analysis.max_time_sec must be a positive number".to_string());
        }
        if !analysis.default_time_sec.is_finite()
            || analysis.default_time_sec > analysis.max_time_sec
        {
            problems.push("analysis.default_time_sec must not exceed max_time_sec".to_string());
        }
        if analysis.max_plies == 0 {
            problems.push("analysis.max_plies must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is a valid "all defaults" config.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Build the effective configuration: file (or defaults), then environment
/// overrides, then validation.
pub fn load_and_validate_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut cfg = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    cfg.apply_env_overrides(|name| std::env::var(name).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_container_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.engine.path, "stockfish");
        assert_eq!(cfg.engine.search_paths, vec![PathBuf::from("/usr/games")]);
        assert_eq!(cfg.analysis.default_depth, 12);
        assert_eq!(cfg.analysis.default_multipv, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let yaml = r#"
server:
  port: 9000
engine:
  path: /opt/engines/stockfish
  pool_size: 4
  options:
    Threads: "2"
    Hash: "64"
analysis:
  max_depth: 20
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.engine.pool_size, 4);
        assert_eq!(cfg.engine.options.get("Hash").map(String::as_str), Some("64"));
        assert_eq!(cfg.analysis.max_depth, 20);
        assert_eq!(cfg.analysis.default_depth, 12);
        assert_eq!(cfg.logging.format, LogFormat::Text);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  format: json\n  filter: debug").unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.filter, "debug");
    }

    #[test]
    fn shipped_config_is_valid() {
        let cfg = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/configs/analyzer.yaml")).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.engine.options.get("Threads").map(String::as_str), Some("1"));
    }

    #[test]
    fn empty_file_means_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load_config(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn unknown_enum_value_is_a_parse_error() {
        let err = serde_yaml::from_str::<Config>("logging:\n  format: xml\n").unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_PORT, "8080"),
            (ENV_ENGINE_PATH, "/usr/local/bin/stockfish"),
            (ENV_POOL_SIZE, "3"),
            (ENV_LOG_FORMAT, "JSON"),
        ]);

        let mut cfg = Config::default();
        cfg.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.engine.path, "/usr/local/bin/stockfish");
        assert_eq!(cfg.engine.pool_size, 3);
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn bad_env_override_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides(|name| (name == ENV_PORT).then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("ANALYZER_PORT"));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut cfg = Config::default();
        cfg.engine.pool_size = 0;
        cfg.analysis.max_multipv = 7;
        cfg.analysis.default_depth = 99;

        match cfg.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 3, "{problems:?}");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
