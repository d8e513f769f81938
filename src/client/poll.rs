//! Poll loop driving the dashboard views.
//!
//! A [`PollSession`] is the `Polling` state: starting it spawns one thread
//! per [`Feed`], each fetching on its own cadence and applying its result to
//! the shared [`ViewState`] as soon as it arrives, so a slow endpoint only
//! delays its own view. Stopping it (or dropping it) returns to `Idle`; a
//! fetch still in flight at that point finishes but its result is thrown
//! away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::history::{HistoryPoint, HistoryRing};
use crate::probe::RunState;
use crate::telemetry::StatsSnapshot;

/// Granularity at which a sleeping poll thread notices a stop request.
const STOP_CHECK: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// API access
// ---------------------------------------------------------------------------

/// The three read endpoints the poll loop depends on.
pub trait DashboardApi: Send + Sync {
    /// Raw `/api/stats` body. May be an `{"error": ...}` object.
    fn stats(&self) -> Result<Value>;
    fn status(&self) -> Result<RunState>;
    fn logs(&self) -> Result<Vec<String>>;
}

/// [`DashboardApi`] over HTTP.
pub struct HttpApi {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct StatusBody {
    status: RunState,
}

#[derive(Deserialize)]
struct LogsBody {
    #[serde(default)]
    logs: Vec<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {url} failed"))?;
        response
            .into_json()
            .with_context(|| format!("invalid JSON from {url}"))
    }
}

impl DashboardApi for HttpApi {
    fn stats(&self) -> Result<Value> {
        self.get_json("/api/stats")
    }

    fn status(&self) -> Result<RunState> {
        let body: StatusBody = serde_json::from_value(self.get_json("/api/status")?)
            .context("unexpected /api/status body")?;
        Ok(body.status)
    }

    fn logs(&self) -> Result<Vec<String>> {
        let body: LogsBody = serde_json::from_value(self.get_json("/api/logs")?)
            .context("unexpected /api/logs body")?;
        Ok(body.logs)
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// The independently polled endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Stats,
    Status,
    Logs,
}

impl Feed {
    pub const ALL: [Feed; 3] = [Feed::Stats, Feed::Status, Feed::Logs];

    pub fn name(self) -> &'static str {
        match self {
            Feed::Stats => "stats",
            Feed::Status => "status",
            Feed::Logs => "logs",
        }
    }
}

/// Outcome of one fetch of one feed.
pub enum FetchResult {
    Stats(Result<Value>),
    Status(Result<RunState>),
    Logs(Result<Vec<String>>),
}

/// Everything the views render. Each field holds the last good value of its
/// own feed.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub stats: Option<StatsSnapshot>,
    pub history: HistoryRing,
    pub status: RunState,
    pub logs: Vec<String>,
    /// Fetch results applied so far, failed ones included.
    pub updates: u64,
}

impl ViewState {
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: HistoryRing::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Apply a stats body. Bodies without a usable timestamp, or that do not
    /// match the snapshot shape, are skipped. Returns whether a history
    /// point was added.
    pub fn apply_stats(&mut self, body: Value) -> bool {
        let Some(point) = HistoryPoint::from_stats(&body) else {
            return false;
        };
        match serde_json::from_value::<StatsSnapshot>(body) {
            Ok(snapshot) => {
                self.stats = Some(snapshot);
                self.history.push(point);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed stats body");
                false
            }
        }
    }

    /// Apply one fetch result. A failure leaves its sub-view untouched.
    pub fn apply(&mut self, result: FetchResult) {
        match result {
            FetchResult::Stats(Ok(body)) => {
                self.apply_stats(body);
            }
            FetchResult::Status(Ok(status)) => self.status = status,
            FetchResult::Logs(Ok(logs)) => self.logs = logs,
            FetchResult::Stats(Err(e)) => tracing::debug!(error = %e, "stats fetch failed"),
            FetchResult::Status(Err(e)) => tracing::debug!(error = %e, "status fetch failed"),
            FetchResult::Logs(Err(e)) => tracing::debug!(error = %e, "logs fetch failed"),
        }
        self.updates += 1;
    }
}

/// Fetch one feed.
pub fn fetch<A: DashboardApi + ?Sized>(api: &A, feed: Feed) -> FetchResult {
    match feed {
        Feed::Stats => FetchResult::Stats(api.stats()),
        Feed::Status => FetchResult::Status(api.status()),
        Feed::Logs => FetchResult::Logs(api.logs()),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

type UpdateHook = Arc<dyn Fn(&ViewState) + Send + Sync>;

pub struct PollSession {
    stopped: Arc<AtomicBool>,
    state: Arc<Mutex<ViewState>>,
    handles: Vec<JoinHandle<()>>,
}

impl PollSession {
    /// Start polling every feed immediately, then every `interval`.
    ///
    /// `on_update` runs with the state lock held after every applied
    /// result, from whichever feed thread produced it.
    pub fn start<A, F>(
        api: Arc<A>,
        interval: Duration,
        state: Arc<Mutex<ViewState>>,
        on_update: F,
    ) -> Self
    where
        A: DashboardApi + ?Sized + 'static,
        F: Fn(&ViewState) + Send + Sync + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let on_update: UpdateHook = Arc::new(on_update);

        let handles = Feed::ALL
            .into_iter()
            .map(|feed| {
                let api = Arc::clone(&api);
                let state = Arc::clone(&state);
                let flag = Arc::clone(&stopped);
                let on_update = Arc::clone(&on_update);
                thread::spawn(move || {
                    poll_feed(api.as_ref(), feed, interval, &state, &flag, &on_update)
                })
            })
            .collect();

        Self {
            stopped,
            state,
            handles,
        }
    }

    /// Stop issuing fetches. Does not wait for fetches in flight, but once
    /// this returns no further result is applied to the view.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Wait out an apply that passed its stop check before the store.
        drop(self.state.lock());
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Block until every feed thread exits. Without a prior
    /// [`stop`](Self::stop) this waits for as long as polling continues.
    pub fn join(mut self) {
        for handle in std::mem::take(&mut self.handles) {
            let _ = handle.join();
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_feed<A: DashboardApi + ?Sized>(
    api: &A,
    feed: Feed,
    interval: Duration,
    state: &Mutex<ViewState>,
    flag: &AtomicBool,
    on_update: &UpdateHook,
) {
    while !flag.load(Ordering::SeqCst) {
        let started = Instant::now();
        let result = fetch(api, feed);

        let Ok(mut view) = state.lock() else {
            tracing::error!(feed = feed.name(), "view state poisoned; stopping poll loop");
            break;
        };
        // Checked under the lock so it cannot interleave with `stop`.
        if flag.load(Ordering::SeqCst) {
            break;
        }
        view.apply(result);
        on_update(&view);
        drop(view);

        sleep_unless_stopped(flag, interval.saturating_sub(started.elapsed()));
    }
}

fn sleep_unless_stopped(flag: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while !flag.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep(STOP_CHECK.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use serde_json::json;

    use super::*;

    fn stats_body(ts: u64, total: u64) -> Value {
        json!({
            "timestamp": ts,
            "total_requests": total,
            "requests_by_app": {"a.com": total},
            "errors_by_app": {"a.com": 1}
        })
    }

    #[test]
    fn apply_keeps_last_good_value_per_view() {
        let mut view = ViewState::default();
        view.apply(FetchResult::Stats(Ok(stats_body(100, 10))));
        view.apply(FetchResult::Status(Ok(RunState::Running)));
        view.apply(FetchResult::Logs(Ok(vec!["first".to_string()])));

        view.apply(FetchResult::Stats(Err(anyhow!("connection refused"))));
        view.apply(FetchResult::Status(Err(anyhow!("connection refused"))));
        view.apply(FetchResult::Logs(Ok(vec!["second".to_string()])));

        assert_eq!(view.status, RunState::Running);
        assert_eq!(view.stats.as_ref().map(|s| s.total_requests), Some(10));
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.logs, vec!["second"]);
        assert_eq!(view.updates, 6);
    }

    #[test]
    fn stats_without_timestamp_leave_state_alone() {
        let mut view = ViewState::default();
        assert!(view.apply_stats(stats_body(100, 10)));
        assert!(!view.apply_stats(json!({"error": "Stats not found"})));
        assert!(!view.apply_stats(json!({"error": "Invalid JSON"})));
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.stats.as_ref().map(|s| s.timestamp), Some(100));
    }

    #[test]
    fn malformed_stats_with_timestamp_are_skipped() {
        let mut view = ViewState::default();
        assert!(!view.apply_stats(json!({"timestamp": 5, "total_requests": "many"})));
        assert!(view.history.is_empty());
        assert!(view.stats.is_none());
    }

    #[test]
    fn history_capacity_is_configurable() {
        let mut view = ViewState::with_history_capacity(3);
        for ts in 1..=5 {
            view.apply_stats(stats_body(ts, ts));
        }
        let totals: Vec<u64> = view.history.iter().map(|p| p.requests).collect();
        assert_eq!(totals, vec![3, 4, 5]);
    }

    #[test]
    fn http_api_trims_trailing_slash() {
        let api = HttpApi::new("http://127.0.0.1:3001/", Duration::from_secs(1));
        assert_eq!(api.base_url(), "http://127.0.0.1:3001");
    }
}
