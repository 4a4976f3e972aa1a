//! Shared mock `ToolRunner` for integration tests.
//!
//! Tests script tool behavior as (program, argument-substring) rules; the
//! first matching rule serves the call. Every invocation is recorded so
//! tests can assert on what ran (and how often).

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use vidgauge_core::{CoreError, CoreResult, ToolOutput, ToolRunner};

#[derive(Clone)]
struct MockRule {
    program: String,
    arg_pattern: String,
    result: Result<ToolOutput, String>,
}

#[derive(Clone, Default)]
pub struct MockToolRunner {
    rules: Rc<RefCell<Vec<MockRule>>>,
    calls: Rc<RefCell<Vec<(String, Vec<String>)>>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Expect a call whose joined arguments contain `arg_pattern`; serve a
    /// zero-exit result with the given stdout/stderr.
    pub fn expect_success(&self, program: &str, arg_pattern: &str, stdout: &str, stderr: &str) {
        self.push_rule(
            program,
            arg_pattern,
            Ok(ToolOutput {
                success: true,
                exit_code: Some(0),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        );
    }

    /// Serve a non-zero exit with the given stderr.
    pub fn expect_exit_failure(&self, program: &str, arg_pattern: &str, exit_code: i32, stderr: &str) {
        self.push_rule(
            program,
            arg_pattern,
            Ok(ToolOutput {
                success: false,
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        );
    }

    /// Serve an invocation error (the process could not be run at all).
    pub fn expect_spawn_error(&self, program: &str, arg_pattern: &str, message: &str) {
        self.push_rule(program, arg_pattern, Err(message.to_string()));
    }

    fn push_rule(&self, program: &str, arg_pattern: &str, result: Result<ToolOutput, String>) {
        self.rules.borrow_mut().push(MockRule {
            program: program.to_string(),
            arg_pattern: arg_pattern.to_string(),
            result,
        });
    }

    /// Total number of recorded invocations.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Number of invocations of `program` whose joined arguments contain
    /// `arg_pattern`.
    pub fn calls_matching(&self, program: &str, arg_pattern: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(p, args)| p == program && args.join(" ").contains(arg_pattern))
            .count()
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, program: &str, args: &[String]) -> CoreResult<ToolOutput> {
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));

        let joined = args.join(" ");
        for rule in self.rules.borrow().iter() {
            if rule.program == program && joined.contains(&rule.arg_pattern) {
                return match &rule.result {
                    Ok(output) => Ok(output.clone()),
                    Err(message) => Err(CoreError::ToolInvocation(message.clone())),
                };
            }
        }

        Err(CoreError::ToolInvocation(format!(
            "unexpected command in test: {} {}",
            program, joined
        )))
    }
}

/// A filter listing covering all three metric filters.
pub const FULL_FILTER_LISTING: &str = "Filters:\n\
      T.. = Timeline support\n\
     ... ssim              VV->V      Calculate the SSIM between two video streams.\n\
     ... psnr              VV->V      Calculate the PSNR between two video streams.\n\
     ..C libvmaf           VV->V      Calculate the VMAF between two video streams.\n\
     ... scale             V->V       Scale the input video size.\n";

/// A filter listing without libvmaf.
pub const NO_VMAF_FILTER_LISTING: &str = "Filters:\n\
     ... ssim              VV->V      Calculate the SSIM between two video streams.\n\
     ... psnr              VV->V      Calculate the PSNR between two video streams.\n\
     ... scale             V->V       Scale the input video size.\n";
