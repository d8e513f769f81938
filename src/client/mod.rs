//! Polling dashboard client.
//!
//! Mirrors what the browser frontend does, for terminals: poll the control
//! API on a fixed cadence, keep a bounded request history, and redraw.
//!
//! Launched via `trafficdash watch`.

pub mod history;
pub mod metrics;
pub mod poll;
pub mod render;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::config::DashConfig;

pub use history::{HistoryPoint, HistoryRing};
pub use metrics::DerivedMetrics;
pub use poll::{DashboardApi, Feed, FetchResult, HttpApi, PollSession, ViewState};

/// Clear screen and move the cursor home.
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Poll `base_url` and redraw the terminal until the process is interrupted.
pub fn watch(cfg: &DashConfig, base_url: &str) -> Result<()> {
    let api = Arc::new(HttpApi::new(
        base_url,
        Duration::from_millis(cfg.dashboard.request_timeout_ms),
    ));
    let state = Arc::new(Mutex::new(ViewState::with_history_capacity(
        cfg.dashboard.history_capacity,
    )));
    let service = cfg.service.name.clone();
    let source = api.base_url().to_string();

    let session = PollSession::start(
        api,
        Duration::from_millis(cfg.dashboard.poll_interval_ms),
        state,
        move |view| {
            let frame = render::render(view, &service);
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "{CLEAR}{frame}\npolling {source} (Ctrl+C to quit)\n");
            let _ = stdout.flush();
        },
    );

    session.join();
    Ok(())
}
