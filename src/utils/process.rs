use std::process::Command;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs an external program to completion.
///
/// Probes depend on this rather than on `std::process` directly so another
/// mechanism (or a fake in tests) can be plugged in.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput> {
        run_command(program, args)
    }
}

pub fn run_command(program: &str, args: &[&str]) -> Result<ProcessOutput> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed executing command: {program} {}", args.join(" ")))?;

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
    })
}
