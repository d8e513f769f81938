//! CLI command implementations for trafficdash.
//!
//! Provides subcommand handlers for:
//! - `trafficdash status`: run state of the generator service
//! - `trafficdash apps list|set`: inspect or edit application weights
//! - `trafficdash interfaces list|set`: inspect or replace the interface list
//! - `trafficdash config show|init`: dashboard configuration management
//!
//! These act on the local files directly, through the same store the HTTP
//! API uses.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{self, DashConfig};
use crate::probe::{self, RunState};
use crate::store::{ApplicationRule, ConfigStore, StoreError};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// trafficdash status
// ---------------------------------------------------------------------------

pub fn run_status(cfg: &DashConfig, format: OutputFormat) -> Result<()> {
    let state = probe::from_config(cfg).query_status(&cfg.service.name);

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "service": cfg.service.name, "status": state });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let label = match state {
                RunState::Running => "running".green().bold(),
                RunState::Stopped => "stopped".red().bold(),
                RunState::Unknown => "unknown".yellow(),
            };
            println!(
                "{} {} ({} probe)",
                format!("{}:", cfg.service.name).bold(),
                label,
                cfg.service.probe
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// trafficdash apps
// ---------------------------------------------------------------------------

pub fn run_apps_list(cfg: &DashConfig, format: OutputFormat) -> Result<()> {
    let store = ConfigStore::from_config(cfg);
    let rules = match store.list_applications() {
        Ok(rules) => rules,
        Err(StoreError::NotFound(path)) => {
            println!(
                "{}",
                format!("No applications file at {}", path.display()).yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        OutputFormat::Table => print_apps_table(&rules),
    }
    Ok(())
}

fn print_apps_table(rules: &[ApplicationRule]) {
    let total: u64 = rules.iter().map(|r| r.weight).sum();

    println!("{}", "Application Weights".bold().cyan());
    println!("  {:<32} {:>8} {:>7}  Endpoint", "Domain", "Weight", "Share");
    println!("  {}", "-".repeat(64));
    for rule in rules {
        let share = if total == 0 {
            0.0
        } else {
            rule.weight as f64 / total as f64 * 100.0
        };
        println!(
            "  {:<32} {:>8} {:>6.1}%  {}",
            truncate(&rule.domain, 32),
            rule.weight,
            share,
            rule.endpoint.dimmed()
        );
    }
    println!();
    println!("  {} {}", "Rules:".bold(), rules.len());
}

pub fn run_apps_set(cfg: &DashConfig, domain: &str, weight: u64) -> Result<()> {
    let store = ConfigStore::from_config(cfg);
    let outcome = store
        .set_application_weight(domain, weight)
        .with_context(|| format!("failed to set weight for {domain}"))?;

    match outcome.matched {
        0 => println!(
            "{}",
            format!("No rule for {domain}; {} unchanged", store.apps_path().display()).yellow()
        ),
        1 => println!("{} {domain} → {weight}", "Updated".green()),
        n => println!(
            "{} {domain} → {weight} {}",
            "Updated".green(),
            format!("({n} duplicate lines)").yellow()
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// trafficdash interfaces
// ---------------------------------------------------------------------------

pub fn run_interfaces_list(cfg: &DashConfig, format: OutputFormat) -> Result<()> {
    let list = ConfigStore::from_config(cfg).list_interfaces();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
        OutputFormat::Table => {
            if list.is_empty() {
                println!("{}", "No interfaces configured.".yellow());
            }
            for name in &list {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

pub fn run_interfaces_set(cfg: &DashConfig, interfaces: &[String]) -> Result<()> {
    let store = ConfigStore::from_config(cfg);
    store
        .replace_interfaces(interfaces)
        .context("failed to replace interfaces")?;
    println!(
        "{} {} interface(s) to {}",
        "Wrote".green(),
        interfaces.len(),
        store.interfaces_path().display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// trafficdash config
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    println!("{}", config::show_effective_config()?);
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Wrote default config to".green(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn truncate_marks_cut_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
