//! Out-of-process verification runner.
//!
//! Launches a child entry point under detector instrumentation, waits for it,
//! and classifies the captured result. Launch command shape, mirroring the
//! original suite's VM-option inheritance:
//!
//! ```text
//! <program> run <ambient flags> <scenario flags> <detector flag> <entry>
//! ```
//!
//! Ambient flags come from [`CHILD_ARGS_ENV`] so the child runs under the
//! same test-infrastructure conventions as the parent. One blocking launch
//! and wait per call; timeouts are the outer test framework's concern.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::HarnessError;
use crate::outcome::{CapturedResult, ExpectedOutcome};

/// Environment variable holding whitespace-separated ambient child flags.
pub const CHILD_ARGS_ENV: &str = "RACECHECK_CHILD_ARGS";
/// Flag appended to every launch to enable the detector in the child.
pub const DETECTOR_FLAG: &str = "--detect";

/// Launches child scenario processes and classifies their behavior.
pub struct Verifier {
    program: PathBuf,
    ambient_args: Vec<String>,
    detector_flag: String,
}

impl Verifier {
    /// A verifier for `program`, inheriting ambient flags from
    /// [`CHILD_ARGS_ENV`].
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ambient_args: split_args(&env::var(CHILD_ARGS_ENV).unwrap_or_default()),
            detector_flag: DETECTOR_FLAG.to_string(),
        }
    }

    pub fn with_ambient_args(mut self, args: Vec<String>) -> Self {
        self.ambient_args = args;
        self
    }

    pub fn with_detector_flag(mut self, flag: impl Into<String>) -> Self {
        self.detector_flag = flag.into();
        self
    }

    /// Launch `entry` as an isolated child process and capture its result.
    ///
    /// A spawn failure is an infrastructure error, never a verdict.
    pub fn run(&self, entry: &str, extra_flags: &[&str]) -> Result<CapturedResult, HarnessError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("run");
        cmd.args(&self.ambient_args);
        cmd.args(extra_flags);
        cmd.arg(&self.detector_flag);
        cmd.arg(entry);

        debug!(
            program = %self.program.display(),
            entry,
            ambient = ?self.ambient_args,
            extra = ?extra_flags,
            "launching child"
        );
        let started = Utc::now();
        let output = cmd.output().map_err(|source| HarnessError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let result = CapturedResult::new(entry, output.status.code(), output.stdout, output.stderr);
        info!(
            entry,
            exit_code = ?result.exit_code,
            elapsed_ms = (Utc::now() - started).num_milliseconds(),
            "child completed"
        );
        Ok(result)
    }

    /// Run `entry` and require exit 0 with no race report in the output.
    pub fn run_expect_clean(
        &self,
        entry: &str,
        extra_flags: &[&str],
    ) -> Result<CapturedResult, HarnessError> {
        let result = self.run(entry, extra_flags)?;
        result.classify(&ExpectedOutcome::clean())?;
        Ok(result)
    }

    /// Run `entry` and require the distinguished report exit code. Callers
    /// layer content requirements on the returned capture.
    pub fn run_expect_flagged(
        &self,
        entry: &str,
        extra_flags: &[&str],
    ) -> Result<CapturedResult, HarnessError> {
        let result = self.run(entry, extra_flags)?;
        result.classify(&ExpectedOutcome::flagged())?;
        Ok(result)
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_args_split_on_whitespace() {
        assert_eq!(
            split_args("  --log debug\t--churn-mb 16 "),
            vec!["--log", "debug", "--churn-mb", "16"]
        );
        assert!(split_args("").is_empty());
    }

    #[test]
    fn missing_program_is_a_spawn_error_not_a_verdict() {
        let verifier = Verifier::new("/nonexistent/racecheck-child-binary")
            .with_ambient_args(Vec::new());
        let err = verifier.run("racy-counter", &[]).expect_err("spawn must fail");
        assert!(err.is_infrastructure());
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }

    #[test]
    fn builder_overrides_replace_env_derived_defaults() {
        let verifier = Verifier::new("racecheck")
            .with_ambient_args(vec!["--log".into(), "info".into()])
            .with_detector_flag("--enable-detector");
        assert_eq!(verifier.ambient_args, vec!["--log", "info"]);
        assert_eq!(verifier.detector_flag, "--enable-detector");
    }
}
