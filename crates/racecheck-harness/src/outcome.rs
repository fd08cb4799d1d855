//! Captured child output and outcome classification.
//!
//! The detector's diagnostic stream is treated purely as text: a report is a
//! line carrying [`REPORT_MARKER`] plus stack-frame lines naming the access
//! site. Classification never parses it into a structured model; it only
//! checks exit codes, substrings, and regexes.

use regex::Regex;
use serde::Serialize;

use crate::error::HarnessError;

/// Fixed marker the detector emits on every data-race report.
pub const REPORT_MARKER: &str = "WARNING: ThreadSanitizer: data race";
/// Exit status the detector forces after emitting at least one report.
pub const REPORT_EXIT_CODE: i32 = 66;
/// Upper bound on output excerpts attached to mismatch errors.
pub const OUTPUT_EXCERPT_MAX: usize = 2000;

/// Exit code and output of one terminated child process.
///
/// Produced exactly once per child and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedResult {
    pub scenario: String,
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedResult {
    pub fn new(scenario: &str, exit_code: Option<i32>, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            scenario: scenario.to_string(),
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }

    /// Both output streams as one text, stdout first.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }

    /// Bounded excerpt of the combined output for error reports.
    pub fn excerpt(&self) -> String {
        let combined = self.combined();
        if combined.len() <= OUTPUT_EXCERPT_MAX {
            return combined;
        }
        let head = truncate_on_char_boundary(&combined, OUTPUT_EXCERPT_MAX);
        format!(
            "{}\n... ({} bytes truncated)",
            head,
            combined.len() - head.len()
        )
    }

    pub fn should_have_exit_code(&self, code: i32) -> Result<&Self, HarnessError> {
        if self.exit_code != Some(code) {
            return Err(self.mismatch(format!("expected exit code {code}")));
        }
        Ok(self)
    }

    pub fn should_contain(&self, needle: &str) -> Result<&Self, HarnessError> {
        if !self.combined().contains(needle) {
            return Err(self.mismatch(format!("output must contain '{needle}'")));
        }
        Ok(self)
    }

    pub fn should_not_contain(&self, needle: &str) -> Result<&Self, HarnessError> {
        if self.combined().contains(needle) {
            return Err(self.mismatch(format!("output must not contain '{needle}'")));
        }
        Ok(self)
    }

    pub fn should_match(&self, pattern: &str) -> Result<&Self, HarnessError> {
        let re = Regex::new(pattern).map_err(|source| HarnessError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        if !re.is_match(&self.combined()) {
            return Err(self.mismatch(format!("output must match /{pattern}/")));
        }
        Ok(self)
    }

    /// Check every constraint of `expected`; deterministic for a fixed
    /// capture. Empty constraints are trivially satisfied.
    pub fn classify(&self, expected: &ExpectedOutcome) -> Result<(), HarnessError> {
        if let Some(code) = expected.exit_code {
            self.should_have_exit_code(code)?;
        }
        for needle in &expected.require {
            self.should_contain(needle)?;
        }
        for needle in &expected.forbid {
            self.should_not_contain(needle)?;
        }
        for pattern in &expected.patterns {
            self.should_match(pattern)?;
        }
        Ok(())
    }

    fn mismatch(&self, requirement: String) -> HarnessError {
        HarnessError::Mismatch {
            scenario: self.scenario.clone(),
            requirement,
            exit_code: self.exit_code,
            excerpt: self.excerpt(),
        }
    }
}

/// Expected child behavior: exit code, required and forbidden substrings,
/// and required regexes, each independently optional.
#[derive(Debug, Clone, Default)]
pub struct ExpectedOutcome {
    pub exit_code: Option<i32>,
    pub require: Vec<String>,
    pub forbid: Vec<String>,
    pub patterns: Vec<String>,
}

impl ExpectedOutcome {
    /// Exit 0 and no race report in the output.
    pub fn clean() -> Self {
        Self::default().with_exit_code(0).forbidding(REPORT_MARKER)
    }

    /// The distinguished report exit code; no content constraint by default.
    pub fn flagged() -> Self {
        Self::default().with_exit_code(REPORT_EXIT_CODE)
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn requiring(mut self, needle: &str) -> Self {
        self.require.push(needle.to_string());
        self
    }

    pub fn forbidding(mut self, needle: &str) -> Self {
        self.forbid.push(needle.to_string());
        self
    }

    pub fn matching(mut self, pattern: &str) -> Self {
        self.patterns.push(pattern.to_string());
        self
    }
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
