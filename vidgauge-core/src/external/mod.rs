//! External tool invocation module
//!
//! This module encapsulates interactions with the external command-line tools
//! (ffmpeg and ffprobe) behind the `ToolRunner` trait. The engine never talks
//! to a process directly; everything goes through this seam so that callers
//! can impose timeouts at the invocation boundary and tests can script tool
//! output without spawning anything.

use std::io;
use std::process::Command;

use crate::error::{CoreError, CoreResult};

pub mod filters;

pub use filters::FilterCapabilities;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Whether the process exited with a zero status
    pub success: bool,

    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,

    /// Captured standard output, lossily decoded
    pub stdout: String,

    /// Captured standard error, lossily decoded
    pub stderr: String,
}

/// Abstraction over running an external command and capturing its output.
///
/// Implementations run the command to completion. A timeout, if wanted,
/// belongs in the implementation; a timed-out run must surface as an
/// ordinary `CoreError::ToolInvocation`.
pub trait ToolRunner {
    /// Run `program` with `args`, capturing exit status, stdout and stderr.
    ///
    /// Returns `Err` only when the process could not be run at all; a
    /// non-zero exit is reported through `ToolOutput::success` so callers
    /// can decide whether it is fatal.
    fn run(&self, program: &str, args: &[String]) -> CoreResult<ToolOutput>;
}

/// Standard implementation of `ToolRunner` using `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdToolRunner;

impl StdToolRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for StdToolRunner {
    fn run(&self, program: &str, args: &[String]) -> CoreResult<ToolOutput> {
        log::debug!("Running command: {} {}", program, args.join(" "));

        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::ToolInvocation(format!("{} not found", program))
            } else {
                CoreError::ToolInvocation(format!("Failed to execute {}: {}", program, e))
            }
        })?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Checks that a required external command is available and executable.
///
/// Runs the command with a `-version` argument and discards the output.
/// Used by consumers to verify ffmpeg/ffprobe presence before starting a
/// batch.
pub fn check_dependency<R: ToolRunner>(runner: &R, cmd_name: &str) -> CoreResult<()> {
    match runner.run(cmd_name, &["-version".to_string()]) {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) => {
            log::warn!("Dependency '{}' not available: {}", cmd_name, e);
            Err(e)
        }
    }
}
