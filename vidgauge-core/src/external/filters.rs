//! Filter capability probing
//!
//! ffmpeg builds differ in which filters they ship (libvmaf in particular is
//! often missing). `FilterCapabilities` asks ffmpeg once for its filter list
//! and memoizes the answer, so a batch can check support for each metric
//! without re-running the listing command.

use std::collections::HashSet;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::external::ToolRunner;

/// Matches a filter listing line: a three-character flag cluster of
/// uppercase letters/dots, whitespace, then the filter identifier.
static FILTER_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[A-Z.]{3}\s+(\S+)").unwrap());

/// Memoized view of the filters supported by the ffmpeg on this system.
///
/// The filter list is queried on first use and cached for the lifetime of
/// the value. Reads of the cached set are lock-free, so a single instance
/// can be shared across threads analyzing independent file pairs.
pub struct FilterCapabilities<R: ToolRunner> {
    runner: R,
    filters: OnceCell<HashSet<String>>,
}

impl<R: ToolRunner> FilterCapabilities<R> {
    /// Create a capability probe backed by the given runner.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            filters: OnceCell::new(),
        }
    }

    /// Check whether ffmpeg supports the named filter.
    ///
    /// The first call runs `ffmpeg -hide_banner -filters`; subsequent calls
    /// are pure lookups. A failed listing invocation is propagated so that
    /// callers can tell "unsupported" apart from "couldn't even ask".
    pub fn filter_supported(&self, filter_name: &str) -> CoreResult<bool> {
        let filters = self.filters.get_or_try_init(|| self.load_filters())?;
        Ok(filters.contains(filter_name))
    }

    fn load_filters(&self) -> CoreResult<HashSet<String>> {
        let args = ["-hide_banner".to_string(), "-filters".to_string()];
        let output = self.runner.run("ffmpeg", &args)?;

        if !output.success {
            return Err(CoreError::ToolInvocation(format!(
                "ffmpeg -filters exited with code {:?}: {}",
                output.exit_code, output.stderr
            )));
        }

        let mut filters = HashSet::new();
        for line in output.stdout.lines() {
            if let Some(captures) = FILTER_LINE_RE.captures(line) {
                filters.insert(captures[1].to_string());
            }
        }

        log::debug!("ffmpeg reports {} available filters", filters.len());
        Ok(filters)
    }
}
