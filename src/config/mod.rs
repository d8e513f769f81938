//! Configuration system for trafficdash.
//!
//! Provides a layered configuration hierarchy:
//!
//! 1. **Built-in defaults**: hardcoded in [`schema::DashConfig::default()`]
//! 2. **User global config**: `~/.trafficdash/config.toml`
//! 3. **Project local config**: `trafficdash.toml` in the current working directory
//! 4. **Environment variables**: highest precedence
//!
//! Files merge key by key: a later layer overrides only the keys it sets,
//! so a `port` in the global file survives a project file that sets only
//! `[service]`. Keys no layer sets keep their built-in defaults.
//!
//! None of these settings change how the config files of the traffic
//! generator are parsed; they only decide where those files live and how the
//! dashboard is served.

pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved dashboard configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> DashConfig {
    // Layers 2 and 3: user global config, then project local config
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file);
    let mut config = merge_layers(layers);

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A malformed file is logged and skipped so the
/// dashboard still starts with the remaining layers.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match parse_layer(&content) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Parse one layer, rejecting files whose keys have the wrong types.
fn parse_layer(content: &str) -> Result<toml::Table> {
    let table: toml::Table = content.parse().context("invalid TOML")?;
    toml::Value::Table(table.clone())
        .try_into::<DashConfig>()
        .context("unexpected config value")?;
    Ok(table)
}

/// Merge file layers key by key over the built-in defaults.
fn merge_layers(layers: impl IntoIterator<Item = toml::Table>) -> DashConfig {
    let mut merged = toml::Table::new();
    for layer in layers {
        merge_tables(&mut merged, layer);
    }
    match toml::Value::Table(merged).try_into() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "merged config is invalid; using defaults");
            DashConfig::default()
        }
    }
}

/// Recursively overlay `overlay` onto `base`. Nested tables merge; any other
/// value replaces what was there.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(nested) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, nested),
                _ => {
                    base.insert(key, toml::Value::Table(nested));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.trafficdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".trafficdash").join("config.toml"))
}

/// Path to the project local config: `trafficdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join("trafficdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CONFIG_DIR`: directory holding `applications.txt` / `interfaces.txt`
/// - `LOG_DIR`: directory holding `stats.json` / `traffic.log`
/// - `PORT`: listening port
/// - `SERVICE_NAME`: service queried for liveness
/// - `TRAFFICDASH_BIND`: listening address
/// - `TRAFFICDASH_PROBE`: liveness mechanism (`systemctl`, `proc`)
/// - `TRAFFICDASH_LOG_LEVEL`: default tracing filter
fn apply_env_overrides<F>(config: &mut DashConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Paths
    if let Some(val) = var("CONFIG_DIR")
        && !val.is_empty()
    {
        config.paths.config_dir = Some(PathBuf::from(val));
    }
    if let Some(val) = var("LOG_DIR")
        && !val.is_empty()
    {
        config.paths.log_dir = Some(PathBuf::from(val));
    }

    // Server
    if let Some(val) = var("PORT")
        && let Ok(port) = val.trim().parse::<u16>()
    {
        config.server.port = port;
    }
    if let Some(val) = var("TRAFFICDASH_BIND")
        && !val.is_empty()
    {
        config.server.bind = val;
    }

    // Service
    if let Some(val) = var("SERVICE_NAME")
        && !val.is_empty()
    {
        config.service.name = val;
    }
    if let Some(val) = var("TRAFFICDASH_PROBE")
        && let Some(kind) = parse_probe(&val)
    {
        config.service.probe = kind;
    }

    // Logging
    if let Some(val) = var("TRAFFICDASH_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Parse a probe kind string.
fn parse_probe(val: &str) -> Option<schema::ProbeKind> {
    match val.to_ascii_lowercase().as_str() {
        "systemctl" | "systemd" => Some(schema::ProbeKind::Systemctl),
        "proc" | "procfs" => Some(schema::ProbeKind::Proc),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.trafficdash/config.toml`.
///
/// Creates the `~/.trafficdash/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.trafficdash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_paths_and_port() {
        let mut cfg = DashConfig::default();
        apply_env_overrides(
            &mut cfg,
            env_of(&[
                ("CONFIG_DIR", "/opt/gen/config"),
                ("LOG_DIR", "/srv/logs"),
                ("PORT", "8088"),
                ("SERVICE_NAME", "trafficgen"),
            ]),
        );
        assert_eq!(cfg.paths.config_dir, Some(PathBuf::from("/opt/gen/config")));
        assert_eq!(cfg.paths.log_dir, Some(PathBuf::from("/srv/logs")));
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.service.name, "trafficgen");
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut cfg = DashConfig::default();
        apply_env_overrides(
            &mut cfg,
            env_of(&[
                ("PORT", "not-a-port"),
                ("TRAFFICDASH_PROBE", "launchd"),
                ("SERVICE_NAME", ""),
            ]),
        );
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.service.probe, schema::ProbeKind::Systemctl);
        assert_eq!(cfg.service.name, "sdwan-traffic-gen");
    }

    #[test]
    fn parse_probe_handles_variants() {
        assert_eq!(parse_probe("systemctl"), Some(schema::ProbeKind::Systemctl));
        assert_eq!(parse_probe("SYSTEMD"), Some(schema::ProbeKind::Systemctl));
        assert_eq!(parse_probe("proc"), Some(schema::ProbeKind::Proc));
        assert_eq!(parse_probe("other"), None);
    }

    #[test]
    fn project_layer_overrides_only_the_keys_it_sets() {
        let global = parse_layer("[server]\nport = 4000\n\n[service]\nname = \"gen-a\"\n").unwrap();
        let project = parse_layer("[service]\nname = \"gen-b\"\n").unwrap();

        let cfg = merge_layers([global, project]);
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.service.name, "gen-b");
        assert_eq!(cfg.server.bind, "0.0.0.0");
    }

    #[test]
    fn no_layers_yield_defaults() {
        let cfg = merge_layers(Vec::new());
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.dashboard.poll_interval_ms, 2000);
    }

    #[test]
    fn mistyped_layer_is_rejected() {
        assert!(parse_layer("[server]\nport = \"high\"\n").is_err());
        assert!(parse_layer("[server\n").is_err());
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: DashConfig = toml::from_str(&toml_str).unwrap();
    }
}
