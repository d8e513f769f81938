//! Embedded HTML/CSS/JS frontend for the traffic generator dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Traffic Generator Control Center</title>
<style>
:root {
  --bg: #020617;
  --surface: #0f172a;
  --border: #1e293b;
  --text: #f1f5f9;
  --text-muted: #94a3b8;
  --accent: #38bdf8;
  --green: #4ade80;
  --red: #f87171;
  --yellow: #facc15;
  --radius: 12px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 32px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
}
header h1 { font-size: 28px; font-weight: 700; color: var(--accent); }
header p { color: var(--text-muted); }

.badge {
  padding: 6px 14px;
  border-radius: 999px;
  border: 1px solid var(--border);
  font-weight: 600;
  font-size: 13px;
}
.badge.running { color: var(--green); border-color: rgba(74, 222, 128, 0.3); }
.badge.stopped { color: var(--red); border-color: rgba(248, 113, 113, 0.3); }
.badge.unknown { color: var(--yellow); border-color: rgba(250, 204, 21, 0.3); }

nav { display: flex; gap: 8px; border-bottom: 1px solid var(--border); margin-bottom: 24px; }
nav button {
  background: none;
  border: none;
  border-bottom: 2px solid transparent;
  color: var(--text-muted);
  padding: 10px 16px;
  font: inherit;
  cursor: pointer;
}
nav button.active { color: var(--accent); border-bottom-color: var(--accent); }

.cards { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; margin-bottom: 24px; }
.card, .panel {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
}
.card .label { color: var(--text-muted); font-size: 13px; }
.card .value { font-size: 30px; font-weight: 700; }
.card .sub { color: var(--text-muted); font-size: 13px; }
.panel { margin-bottom: 24px; }
.panel h3 { font-size: 16px; margin-bottom: 12px; }

#chart { width: 100%; height: 260px; }
#chart .grid { stroke: var(--border); stroke-dasharray: 3 3; }
#chart .line { fill: none; stroke: var(--accent); stroke-width: 2; }
#chart text { fill: var(--text-muted); font-size: 11px; }

.logs {
  font-family: var(--mono);
  font-size: 13px;
  height: 300px;
  overflow-y: auto;
  color: #cbd5e1;
}
.logs div { border-bottom: 1px solid rgba(30, 41, 59, 0.5); padding: 2px 0; }
.logs .placeholder { color: #475569; font-style: italic; border: none; }

table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
input[type=number], textarea {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 8px;
  font: inherit;
}
input[type=number] { width: 90px; }
textarea { width: 100%; min-height: 140px; font-family: var(--mono); }
.btn {
  background: var(--accent);
  color: var(--bg);
  border: none;
  border-radius: 6px;
  padding: 6px 14px;
  font-weight: 600;
  cursor: pointer;
}
.btn:disabled { opacity: 0.5; cursor: default; }
.muted { color: var(--text-muted); }

#toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  padding: 10px 16px;
  border-radius: 8px;
  background: var(--surface);
  border: 1px solid var(--border);
  display: none;
}
#toast.error { border-color: var(--red); color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1>SD-WAN Traffic Generator</h1>
      <p>Real-time Control Center</p>
    </div>
    <span id="status" class="badge unknown">UNKNOWN</span>
  </header>

  <nav>
    <button data-view="dashboard" class="active">Dashboard</button>
    <button data-view="config">Configuration</button>
  </nav>

  <section id="view-dashboard">
    <div class="cards">
      <div class="card"><div class="label">Total Requests</div><div class="value" id="m-total">0</div></div>
      <div class="card"><div class="label">Success Rate</div><div class="value" id="m-rate">100.0%</div><div class="sub" id="m-errors">0 Errors</div></div>
      <div class="card"><div class="label">Active Apps</div><div class="value" id="m-apps">0</div></div>
    </div>
    <div class="panel">
      <h3>Traffic Volume</h3>
      <svg id="chart" preserveAspectRatio="none"></svg>
    </div>
    <div class="panel">
      <h3>Live Logs</h3>
      <div class="logs" id="logs"></div>
    </div>
  </section>

  <section id="view-config" hidden>
    <div class="panel">
      <h3>Application Weights</h3>
      <div id="apps"><span class="muted">Loading...</span></div>
    </div>
    <div class="panel">
      <h3>Network Interfaces</h3>
      <p class="muted">One interface per line. Saving replaces the whole file.</p>
      <textarea id="interfaces"></textarea>
      <p><button class="btn" id="save-interfaces">Save Interfaces</button></p>
    </div>
  </section>
</div>
<div id="toast"></div>

<script>
const POLL_MS = 2000;
const HISTORY_MAX = 20;

// Poll state. Owned by the dashboard view: started when it is shown,
// stopped when it is hidden. `generation` lets late responses from a
// stopped session be dropped. Each fetch renders as soon as it settles so a
// slow endpoint never holds back the others.
const poll = { timer: null, generation: 0 };
const state = { stats: null, history: [], status: 'unknown', logs: [] };

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error + (data.details ? ': ' + data.details : ''));
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = isError ? 'error' : '';
  el.style.display = 'block';
  setTimeout(() => { el.style.display = 'none'; }, 2500);
}

function esc(s) {
  return String(s).replace(/[&<>"']/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));
}

// ---------------------------------------------------------------------------
// Dashboard polling
// ---------------------------------------------------------------------------

async function fetchStats(gen) {
  try {
    const data = await api('GET', '/api/stats');
    if (gen !== poll.generation || !data.timestamp) return;
    state.stats = data;
    state.history.push({
      time: new Date(data.timestamp * 1000).toLocaleTimeString(),
      requests: data.total_requests,
      by_app: { ...data.requests_by_app },
    });
    while (state.history.length > HISTORY_MAX) state.history.shift();
  } catch (e) {
    console.error('Failed to fetch stats', e);
  }
}

async function fetchStatus(gen) {
  try {
    const data = await api('GET', '/api/status');
    if (gen === poll.generation && data.status) state.status = data.status;
  } catch (e) {
    console.error('Failed to fetch status', e);
  }
}

async function fetchLogs(gen) {
  try {
    const data = await api('GET', '/api/logs');
    if (gen === poll.generation && Array.isArray(data.logs)) state.logs = data.logs;
  } catch (e) {
    console.error('Failed to fetch logs', e);
  }
}

function tick() {
  const gen = poll.generation;
  for (const fetchOne of [fetchStats, fetchStatus, fetchLogs]) {
    fetchOne(gen).finally(() => {
      if (gen === poll.generation) renderDashboard();
    });
  }
}

function startPolling() {
  if (poll.timer !== null) return;
  poll.generation += 1;
  tick();
  poll.timer = setInterval(tick, POLL_MS);
}

function stopPolling() {
  if (poll.timer === null) return;
  clearInterval(poll.timer);
  poll.timer = null;
  poll.generation += 1;
}

function successRate(stats) {
  if (!stats || !stats.total_requests) return '100.0';
  const errors = Object.values(stats.errors_by_app || {}).reduce((a, b) => a + b, 0);
  return ((stats.total_requests - errors) / stats.total_requests * 100).toFixed(1);
}

function renderDashboard() {
  const badge = document.getElementById('status');
  badge.className = 'badge ' + state.status;
  badge.textContent = state.status.toUpperCase();

  const stats = state.stats;
  const errors = stats ? Object.values(stats.errors_by_app || {}).reduce((a, b) => a + b, 0) : 0;
  document.getElementById('m-total').textContent = stats ? stats.total_requests : 0;
  document.getElementById('m-rate').textContent = successRate(stats) + '%';
  document.getElementById('m-errors').textContent = errors + ' Errors';
  document.getElementById('m-apps').textContent = stats ? Object.keys(stats.requests_by_app || {}).length : 0;

  renderChart();

  const logs = document.getElementById('logs');
  logs.innerHTML = state.logs.length
    ? state.logs.map(l => '<div>' + esc(l) + '</div>').join('')
    : '<div class="placeholder">Waiting for logs... (Make sure traffic logs exist)</div>';
}

function renderChart() {
  const svg = document.getElementById('chart');
  const w = svg.clientWidth || 800, h = svg.clientHeight || 260, pad = 36;
  svg.setAttribute('viewBox', `0 0 ${w} ${h}`);
  const pts = state.history;
  if (!pts.length) { svg.innerHTML = ''; return; }

  const max = Math.max(1, ...pts.map(p => p.requests));
  const x = i => pad + (pts.length === 1 ? 0 : i * (w - 2 * pad) / (pts.length - 1));
  const y = v => h - pad - v * (h - 2 * pad) / max;

  let out = '';
  for (let g = 0; g <= 4; g++) {
    const gy = pad + g * (h - 2 * pad) / 4;
    out += `<line class="grid" x1="${pad}" x2="${w - pad}" y1="${gy}" y2="${gy}"/>`;
    out += `<text x="4" y="${gy + 4}">${Math.round(max * (4 - g) / 4)}</text>`;
  }
  out += `<polyline class="line" points="${pts.map((p, i) => x(i) + ',' + y(p.requests)).join(' ')}"/>`;
  out += `<text x="${pad}" y="${h - 8}">${esc(pts[0].time)}</text>`;
  out += `<text x="${w - pad}" y="${h - 8}" text-anchor="end">${esc(pts[pts.length - 1].time)}</text>`;
  svg.innerHTML = out;
}

// ---------------------------------------------------------------------------
// Configuration editor
// ---------------------------------------------------------------------------

async function loadConfig() {
  const [apps, interfaces] = await Promise.all([
    api('GET', '/api/config/apps').catch(() => ({ error: 'Config not found' })),
    api('GET', '/api/config/interfaces').catch(() => []),
  ]);
  renderApps(apps);
  document.getElementById('interfaces').value = Array.isArray(interfaces) ? interfaces.join('\n') : '';
}

function renderApps(apps) {
  const el = document.getElementById('apps');
  if (!Array.isArray(apps)) {
    el.innerHTML = '<span class="muted">' + esc(apps.error || 'Config not found') + '</span>';
    return;
  }
  el.innerHTML = '<table><thead><tr><th>Domain</th><th>Endpoint</th><th>Weight</th><th></th></tr></thead><tbody>'
    + apps.map((a, i) => `<tr><td>${esc(a.domain)}</td><td class="muted">${esc(a.endpoint)}</td>`
      + `<td><input type="number" min="0" id="w-${i}" value="${a.weight}"></td>`
      + `<td><button class="btn" data-domain="${esc(a.domain)}" data-idx="${i}">Save</button></td></tr>`).join('')
    + '</tbody></table>';
  el.querySelectorAll('button[data-domain]').forEach(btn => {
    btn.addEventListener('click', () => saveWeight(btn));
  });
}

async function saveWeight(btn) {
  const weight = parseInt(document.getElementById('w-' + btn.dataset.idx).value, 10);
  if (isNaN(weight) || weight < 0) { toast('Weight must be a non-negative integer', true); return; }
  btn.disabled = true;
  try {
    await api('POST', '/api/config/apps', { domain: btn.dataset.domain, weight });
    toast('Saved weight for ' + btn.dataset.domain);
  } catch (e) {
    toast(e.message, true);
  } finally {
    btn.disabled = false;
  }
}

async function saveInterfaces() {
  const btn = document.getElementById('save-interfaces');
  const interfaces = document.getElementById('interfaces').value
    .split('\n').map(s => s.trim()).filter(s => s && !s.startsWith('#'));
  btn.disabled = true;
  try {
    await api('POST', '/api/config/interfaces', { interfaces });
    toast('Saved ' + interfaces.length + ' interface(s)');
  } catch (e) {
    toast(e.message, true);
  } finally {
    btn.disabled = false;
  }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

function show(view) {
  document.querySelectorAll('nav button').forEach(b => b.classList.toggle('active', b.dataset.view === view));
  document.getElementById('view-dashboard').hidden = view !== 'dashboard';
  document.getElementById('view-config').hidden = view !== 'config';
  if (view === 'dashboard') {
    startPolling();
  } else {
    stopPolling();
    loadConfig();
  }
}

document.querySelectorAll('nav button').forEach(b => b.addEventListener('click', () => show(b.dataset.view)));
document.getElementById('save-interfaces').addEventListener('click', saveInterfaces);
window.addEventListener('pagehide', stopPolling);
show('dashboard');
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_calls_every_endpoint() {
        for path in [
            "/api/status",
            "/api/stats",
            "/api/logs",
            "/api/config/apps",
            "/api/config/interfaces",
        ] {
            assert!(INDEX_HTML.contains(path), "frontend never calls {path}");
        }
    }

    #[test]
    fn frontend_keeps_twenty_points() {
        assert!(INDEX_HTML.contains("const HISTORY_MAX = 20;"));
        assert!(INDEX_HTML.contains("const POLL_MS = 2000;"));
    }

    #[test]
    fn frontend_renders_each_fetch_as_it_settles() {
        assert!(!INDEX_HTML.contains("Promise.allSettled"));
        assert!(INDEX_HTML.contains("fetchOne(gen).finally("));
        assert!(INDEX_HTML.contains("by_app: { ...data.requests_by_app }"));
    }
}
