//! Terminal rendering of a [`ViewState`].

use colored::Colorize;

use super::metrics::DerivedMetrics;
use super::poll::ViewState;
use crate::probe::RunState;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Log lines shown under the chart.
const LOG_ROWS: usize = 15;

pub const LOGS_PLACEHOLDER: &str = "Waiting for logs... (Make sure traffic logs exist)";

/// Render the whole dashboard as one frame of text.
pub fn render(view: &ViewState, service: &str) -> String {
    let metrics = DerivedMetrics::from_snapshot(view.stats.as_ref());
    let mut out = String::new();

    out.push_str(&format!(
        "{}  {}\n",
        "Traffic Generator Control Center".bold().cyan(),
        status_badge(view.status)
    ));
    out.push_str(&format!("{}\n\n", format!("service: {service}").dimmed()));

    out.push_str(&format!(
        "  {} {:<10} {} {:<14} {} {}\n",
        "Total Requests:".bold(),
        metrics.total_requests,
        "Success Rate:".bold(),
        format!("{}% ({} errors)", metrics.success_rate, metrics.total_errors),
        "Active Apps:".bold(),
        metrics.active_apps,
    ));
    out.push('\n');

    out.push_str(&format!("{}\n", "Traffic Volume".bold().cyan()));
    let requests: Vec<u64> = view.history.iter().map(|p| p.requests).collect();
    if requests.is_empty() {
        out.push_str(&format!("  {}\n", "no samples yet".dimmed()));
    } else {
        let first = view.history.iter().next().map(|p| p.time.as_str()).unwrap_or("");
        let last = view.history.latest().map(|p| p.time.as_str()).unwrap_or("");
        out.push_str(&format!("  {}\n", sparkline(&requests)));
        out.push_str(&format!("  {}\n", format!("{first} .. {last}").dimmed()));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", "Live Logs".bold().cyan()));
    if view.logs.is_empty() {
        out.push_str(&format!("  {}\n", LOGS_PLACEHOLDER.italic().dimmed()));
    } else {
        let skip = view.logs.len().saturating_sub(LOG_ROWS);
        for line in &view.logs[skip..] {
            out.push_str(&format!("  {line}\n"));
        }
    }

    out
}

fn status_badge(status: RunState) -> String {
    let label = format!("● {}", status.as_str().to_uppercase());
    match status {
        RunState::Running => label.green().bold().to_string(),
        RunState::Stopped => label.red().bold().to_string(),
        RunState::Unknown => label.yellow().to_string(),
    }
}

/// Scale values between the window's min and max onto block characters.
pub fn sparkline(values: &[u64]) -> String {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = max - min;
    values
        .iter()
        .map(|&v| {
            if span == 0 {
                SPARK[SPARK.len() / 2]
            } else {
                let idx = ((v - min) * (SPARK.len() as u64 - 1) + span / 2) / span;
                SPARK[idx as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::client::history::HistoryPoint;
    use crate::telemetry::StatsSnapshot;

    #[test]
    fn sparkline_spans_min_to_max() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[0, 7]), "▁█");
        assert_eq!(sparkline(&[5, 5, 5]), "▅▅▅");
        assert_eq!(sparkline(&[10, 20, 30]).chars().count(), 3);
    }

    #[test]
    fn empty_view_shows_placeholders() {
        colored::control::set_override(false);
        let frame = render(&ViewState::default(), "gen");
        assert!(frame.contains("UNKNOWN"));
        assert!(frame.contains("100.0%"));
        assert!(frame.contains(LOGS_PLACEHOLDER));
        assert!(frame.contains("no samples yet"));
    }

    #[test]
    fn populated_view_shows_metrics_and_logs() {
        colored::control::set_override(false);
        let mut view = ViewState::default();
        view.status = RunState::Running;
        view.stats = Some(StatsSnapshot {
            timestamp: 1,
            total_requests: 100,
            requests_by_app: BTreeMap::from([("a.com".to_string(), 100)]),
            errors_by_app: BTreeMap::from([("a.com".to_string(), 25)]),
        });
        view.history.push(HistoryPoint {
            time: "10:00:00".to_string(),
            requests: 100,
            by_app: BTreeMap::new(),
        });
        view.logs = (0..20).map(|i| format!("line {i}")).collect();

        let frame = render(&view, "gen");
        assert!(frame.contains("RUNNING"));
        assert!(frame.contains("75.0% (25 errors)"));
        assert!(frame.contains("line 19"));
        assert!(!frame.contains("line 4\n"));
        assert!(frame.contains("10:00:00"));
    }
}
