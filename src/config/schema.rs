//! Configuration schema and defaults for the dashboard.
//!
//! Defines the TOML-serializable configuration structure with all sections:
//! `[paths]`, `[server]`, `[service]`, `[dashboard]`, `[store]` and
//! `[logging]`.
//!
//! Every field has a sensible built-in default. Users only need to set the
//! values they want to override.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Log directory used by packaged installs of the traffic generator.
pub const SYSTEM_LOG_DIR: &str = "/var/log/sdwan-traffic-gen";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level dashboard configuration.
///
/// Maps directly to `~/.trafficdash/config.toml` and `./trafficdash.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub dashboard: DashboardConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [paths]
// ---------------------------------------------------------------------------

/// Locations of the files shared with the traffic generator.
///
/// `config_dir` and `log_dir` are optional: when unset they resolve at
/// runtime (see [`PathsConfig::resolved_log_dir`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub apps_file: String,
    pub interfaces_file: String,
    pub stats_file: String,
    pub log_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: None,
            log_dir: None,
            apps_file: "applications.txt".to_string(),
            interfaces_file: "interfaces.txt".to_string(),
            stats_file: "stats.json".to_string(),
            log_file: "traffic.log".to_string(),
        }
    }
}

impl PathsConfig {
    /// Directory holding `applications.txt` and `interfaces.txt`.
    pub fn resolved_config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("config"))
    }

    /// Directory holding `stats.json` and `traffic.log`.
    ///
    /// Falls back to the system log directory when it exists, otherwise to
    /// `./logs` (development checkouts).
    pub fn resolved_log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        if Path::new(SYSTEM_LOG_DIR).exists() {
            PathBuf::from(SYSTEM_LOG_DIR)
        } else {
            PathBuf::from("logs")
        }
    }

    pub fn apps_path(&self) -> PathBuf {
        self.resolved_config_dir().join(&self.apps_file)
    }

    pub fn interfaces_path(&self) -> PathBuf {
        self.resolved_config_dir().join(&self.interfaces_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.resolved_log_dir().join(&self.stats_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolved_log_dir().join(&self.log_file)
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Open the dashboard in the default browser after start-up.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3001,
            open_browser: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Mechanism used to decide whether the traffic generator is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    /// `systemctl is-active <name>`.
    #[default]
    Systemctl,
    /// Scan `/proc` for a process with a matching name.
    Proc,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Systemctl => write!(f, "systemctl"),
            Self::Proc => write!(f, "proc"),
        }
    }
}

/// The external service being observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub probe: ProbeKind,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "sdwan-traffic-gen".to_string(),
            probe: ProbeKind::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Client polling settings (terminal and browser clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub poll_interval_ms: u64,
    /// Number of points kept in the rolling request history.
    pub history_capacity: usize,
    /// Number of log lines returned by `/api/logs`.
    pub log_lines: usize,
    pub request_timeout_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            history_capacity: 20,
            log_lines: 50,
            request_timeout_ms: 5000,
        }
    }
}

// ---------------------------------------------------------------------------
// [store]
// ---------------------------------------------------------------------------

/// Config file write behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Write to a sibling temp file and rename over the target instead of
    /// truncating the target in place.
    pub atomic_writes: bool,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config written by `trafficdash config init`.
    pub fn default_toml() -> &'static str {
        r#"# trafficdash configuration
#
# Environment overrides: CONFIG_DIR, LOG_DIR, PORT, SERVICE_NAME,
# TRAFFICDASH_BIND, TRAFFICDASH_PROBE, TRAFFICDASH_LOG_LEVEL

[paths]
# config_dir = "/opt/sdwan-traffic-gen/config"
# log_dir = "/var/log/sdwan-traffic-gen"
apps_file = "applications.txt"
interfaces_file = "interfaces.txt"
stats_file = "stats.json"
log_file = "traffic.log"

[server]
bind = "0.0.0.0"
port = 3001
open_browser = false

[service]
name = "sdwan-traffic-gen"
# "systemctl" or "proc"
probe = "systemctl"

[dashboard]
poll_interval_ms = 2000
history_capacity = 20
log_lines = 50
request_timeout_ms = 5000

[store]
atomic_writes = false

[logging]
level = "info"
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let cfg: DashConfig = toml::from_str(DashConfig::default_toml()).unwrap();
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.service.name, "sdwan-traffic-gen");
        assert_eq!(cfg.service.probe, ProbeKind::Systemctl);
        assert_eq!(cfg.dashboard.history_capacity, 20);
        assert_eq!(cfg.dashboard.log_lines, 50);
        assert!(!cfg.store.atomic_writes);
        assert!(cfg.paths.config_dir.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: DashConfig = toml::from_str(
            r#"
[server]
port = 8080
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.dashboard.poll_interval_ms, 2000);
    }

    #[test]
    fn probe_kind_is_kebab_case() {
        let cfg: DashConfig = toml::from_str("[service]\nprobe = \"proc\"\n").unwrap();
        assert_eq!(cfg.service.probe, ProbeKind::Proc);
        assert_eq!(ProbeKind::Proc.to_string(), "proc");
    }

    #[test]
    fn explicit_dirs_resolve_file_paths() {
        let paths = PathsConfig {
            config_dir: Some(PathBuf::from("/etc/gen")),
            log_dir: Some(PathBuf::from("/tmp/gen-logs")),
            ..PathsConfig::default()
        };
        assert_eq!(paths.apps_path(), PathBuf::from("/etc/gen/applications.txt"));
        assert_eq!(
            paths.interfaces_path(),
            PathBuf::from("/etc/gen/interfaces.txt")
        );
        assert_eq!(paths.stats_path(), PathBuf::from("/tmp/gen-logs/stats.json"));
        assert_eq!(paths.log_path(), PathBuf::from("/tmp/gen-logs/traffic.log"));
    }

    #[test]
    fn server_addr_joins_bind_and_port() {
        let server = ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 9000,
            open_browser: false,
        };
        assert_eq!(server.addr(), "127.0.0.1:9000");
    }
}
