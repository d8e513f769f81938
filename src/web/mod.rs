//! Embedded web dashboard for the traffic generator.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard with live charts and a configuration editor
//! - JSON API endpoints for status, stats, logs, and config management
//!
//! Launched via `trafficdash serve` (default: `http://0.0.0.0:3001`).

pub mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::config::DashConfig;

pub use api::{ApiContext, ApiReply};
pub use frontend::INDEX_HTML;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server.
///
/// Blocks the current thread. Each request is handled on its own thread so a
/// slow probe or tail stalls only that request.
pub fn serve(cfg: &DashConfig) -> Result<()> {
    let addr = cfg.server.addr();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let ctx = Arc::new(ApiContext::from_config(cfg));
    tracing::info!(
        %addr,
        apps = %ctx.store.apps_path().display(),
        interfaces = %ctx.store.interfaces_path().display(),
        stats = %ctx.telemetry.stats_path().display(),
        log = %ctx.telemetry.log_path().display(),
        service = %ctx.service_name,
        "dashboard listening"
    );

    if cfg.server.open_browser {
        let url = format!("http://{}", browser_addr(cfg));
        if let Err(e) = open_browser(&url) {
            tracing::debug!(error = %e, "could not open browser");
        }
    }

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        std::thread::spawn(move || handle(&ctx, request));
    }

    Ok(())
}

/// `0.0.0.0` is not browsable; point the browser at loopback instead.
fn browser_addr(cfg: &DashConfig) -> String {
    match cfg.server.bind.as_str() {
        "0.0.0.0" | "::" | "[::]" => format!("127.0.0.1:{}", cfg.server.port),
        _ => cfg.server.addr(),
    }
}

fn handle(ctx: &ApiContext, mut request: Request) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut buf) {
            tracing::warn!(%method, %url, error = %e, "failed to read request body");
        }
        Some(buf)
    } else {
        None
    };

    let reply = panic::catch_unwind(AssertUnwindSafe(|| {
        dispatch(ctx, &method, &url, body.as_deref())
    }))
    .unwrap_or_else(|_| {
        tracing::error!(%method, %url, "handler panicked");
        Reply::Api(ApiReply::error(
            500,
            serde_json::json!({ "error": "Internal error" }),
        ))
    });
    let status = reply.status();
    if let Err(e) = request.respond(reply.into_response()) {
        tracing::debug!(%method, %url, error = %e, "client went away");
    }

    tracing::info!(
        %method,
        %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// What a request resolves to, before it becomes a `tiny_http` response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Api(ApiReply),
    Html(&'static str),
    /// CORS preflight.
    NoContent,
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Reply::Api(reply) => reply.status,
            Reply::Html(_) => 200,
            Reply::NoContent => 204,
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let status = self.status();
        let response = match self {
            Reply::Api(reply) => Response::from_data(reply.body.to_string().into_bytes())
                .with_header(content_type_json()),
            Reply::Html(html) => {
                Response::from_data(html.as_bytes().to_vec()).with_header(content_type_html())
            }
            Reply::NoContent => Response::from_data(Vec::new()),
        };
        cors_headers()
            .into_iter()
            .fold(response, |resp, header| resp.with_header(header))
            .with_status_code(StatusCode(status))
    }
}

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(ctx: &ApiContext, method: &Method, url: &str, body: Option<&str>) -> Reply {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);
    let body = body.unwrap_or("{}");

    match (method, path) {
        (&Method::Options, _) => Reply::NoContent,

        // API: runtime
        (&Method::Get, "/api/status") => Reply::Api(api::get_status(ctx)),
        (&Method::Get, "/api/stats") => Reply::Api(api::get_stats(ctx)),
        (&Method::Get, "/api/logs") => Reply::Api(api::get_logs(ctx)),

        // API: configuration
        (&Method::Get, "/api/config/apps") => Reply::Api(api::get_apps(ctx)),
        (&Method::Post, "/api/config/apps") => Reply::Api(api::post_apps(ctx, body)),
        (&Method::Get, "/api/config/interfaces") => Reply::Api(api::get_interfaces(ctx)),
        (&Method::Post, "/api/config/interfaces") => Reply::Api(api::post_interfaces(ctx, body)),

        // Unknown API routes
        (_, p) if p == "/api" || p.starts_with("/api/") => not_found(),

        // Frontend, including SPA fallback
        (&Method::Get, _) => Reply::Html(frontend::INDEX_HTML),

        _ => not_found(),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn not_found() -> Reply {
    Reply::Api(ApiReply {
        status: 404,
        body: serde_json::json!({ "error": "not found" }),
    })
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name, value)
        .expect("static header name and value are valid ASCII")
}

/// JSON content type header.
fn content_type_json() -> Header {
    header("Content-Type", "application/json; charset=utf-8")
}

/// HTML content type header.
fn content_type_html() -> Header {
    header("Content-Type", "text/html; charset=utf-8")
}

/// Permissive CORS so a dev frontend on another port can call the API.
fn cors_headers() -> [Header; 3] {
    [
        header("Access-Control-Allow-Origin", "*"),
        header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        header("Access-Control-Allow-Headers", "Content-Type"),
    ]
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_addr_avoids_wildcard() {
        let mut cfg = DashConfig::default();
        assert_eq!(browser_addr(&cfg), "127.0.0.1:3001");
        cfg.server.bind = "192.168.1.10".to_string();
        assert_eq!(browser_addr(&cfg), "192.168.1.10:3001");
    }

    #[test]
    fn reply_status_codes() {
        assert_eq!(Reply::NoContent.status(), 204);
        assert_eq!(Reply::Html("x").status(), 200);
        assert_eq!(not_found().status(), 404);
    }
}
