//! Liveness of the external traffic generator.
//!
//! The dashboard does not own the generator's lifecycle; it only asks the
//! host whether a service with the configured name is running. Every probe
//! collapses its own failures into [`RunState::Unknown`] instead of
//! returning them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::schema::{DashConfig, ProbeKind};
use crate::utils::process::{CommandRunner, SystemRunner};

/// Run state of the external service. Derived fresh on every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
    #[default]
    Unknown,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait LivenessProbe: Send + Sync {
    fn query_status(&self, service: &str) -> RunState;
}

/// Build the probe selected by `[service] probe`.
pub fn from_config(cfg: &DashConfig) -> Box<dyn LivenessProbe> {
    match cfg.service.probe {
        ProbeKind::Systemctl => Box::new(SystemctlProbe::new(SystemRunner)),
        ProbeKind::Proc => Box::new(ProcTableProbe::default()),
    }
}

// ---------------------------------------------------------------------------
// systemctl
// ---------------------------------------------------------------------------

/// `systemctl is-active <service>`.
///
/// `active` maps to running and any other answer (`inactive`, `failed`,
/// `activating`, ...) to stopped. A spawn failure or an empty answer means
/// systemd could not be asked, which is unknown.
pub struct SystemctlProbe<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> SystemctlProbe<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> LivenessProbe for SystemctlProbe<R> {
    fn query_status(&self, service: &str) -> RunState {
        let output = match self.runner.run("systemctl", &["is-active", service]) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(service, error = %e, "systemctl unavailable");
                return RunState::Unknown;
            }
        };

        match output.stdout.trim() {
            "active" => RunState::Running,
            "" => {
                tracing::debug!(service, stderr = %output.stderr.trim(), "systemctl gave no answer");
                RunState::Unknown
            }
            _ => RunState::Stopped,
        }
    }
}

// ---------------------------------------------------------------------------
// /proc
// ---------------------------------------------------------------------------

/// Scans the Linux process table for a process named like the service.
///
/// Matches `/proc/<pid>/comm` (truncated to 15 bytes by the kernel) and the
/// basename of `argv[0]` / `argv[1]` from `cmdline`, which covers services
/// started as `bash /opt/.../sdwan-traffic-gen`.
#[derive(Debug, Clone)]
pub struct ProcTableProbe {
    root: PathBuf,
}

impl Default for ProcTableProbe {
    fn default() -> Self {
        Self::with_root("/proc")
    }
}

impl ProcTableProbe {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn process_matches(dir: &Path, service: &str) -> bool {
        if let Ok(comm) = fs::read_to_string(dir.join("comm")) {
            let comm = comm.trim_end();
            let truncated: String = service.chars().take(15).collect();
            if comm == service || comm == truncated {
                return true;
            }
        }
        let Ok(cmdline) = fs::read(dir.join("cmdline")) else {
            return false;
        };
        cmdline
            .split(|&b| b == 0)
            .take(2)
            .filter_map(|arg| std::str::from_utf8(arg).ok())
            .any(|arg| arg.rsplit('/').next() == Some(service))
    }
}

impl LivenessProbe for ProcTableProbe {
    fn query_status(&self, service: &str) -> RunState {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "process table unavailable");
                return RunState::Unknown;
            }
        };

        let found = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.bytes().all(|b| b.is_ascii_digit()))
            })
            .any(|entry| Self::process_matches(&entry.path(), service));

        if found {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow};

    use super::*;
    use crate::utils::process::ProcessOutput;

    struct FakeRunner(Option<&'static str>);

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput> {
            assert_eq!(program, "systemctl");
            assert_eq!(args[0], "is-active");
            match self.0 {
                Some(stdout) => Ok(ProcessOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(if stdout.trim() == "active" { 0 } else { 3 }),
                    success: stdout.trim() == "active",
                }),
                None => Err(anyhow!("No such file or directory (os error 2)")),
            }
        }
    }

    #[test]
    fn systemctl_maps_answers() {
        let probe = |out| SystemctlProbe::new(FakeRunner(out)).query_status("gen");
        assert_eq!(probe(Some("active\n")), RunState::Running);
        assert_eq!(probe(Some("inactive\n")), RunState::Stopped);
        assert_eq!(probe(Some("failed\n")), RunState::Stopped);
        assert_eq!(probe(Some("")), RunState::Unknown);
        assert_eq!(probe(None), RunState::Unknown);
    }

    #[test]
    fn run_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RunState::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(RunState::Stopped.to_string(), "stopped");
        assert_eq!(RunState::default(), RunState::Unknown);
    }

    fn fake_proc(procs: &[(&str, &str, &str)]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for (pid, comm, cmdline) in procs {
            let dir = root.path().join(pid);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
            fs::write(dir.join("cmdline"), cmdline).unwrap();
        }
        fs::create_dir(root.path().join("self")).unwrap();
        root
    }

    #[test]
    fn proc_probe_matches_comm_and_cmdline() {
        let root = fake_proc(&[
            ("1", "systemd", "/sbin/init\0"),
            ("42", "bash", "bash\0/opt/gen/sdwan-traffic-gen\0--quiet\0"),
        ]);
        let probe = ProcTableProbe::with_root(root.path());
        assert_eq!(probe.query_status("sdwan-traffic-gen"), RunState::Running);
        assert_eq!(probe.query_status("systemd"), RunState::Running);
        assert_eq!(probe.query_status("nginx"), RunState::Stopped);
    }

    #[test]
    fn proc_probe_matches_truncated_comm() {
        let root = fake_proc(&[("7", "sdwan-traffic-g", "")]);
        let probe = ProcTableProbe::with_root(root.path());
        assert_eq!(probe.query_status("sdwan-traffic-gen"), RunState::Running);
    }

    #[test]
    fn proc_probe_without_table_is_unknown() {
        let probe = ProcTableProbe::with_root("/definitely/not/proc");
        assert_eq!(probe.query_status("gen"), RunState::Unknown);
    }
}
