use std::io;

use thiserror::Error;

/// Parent-side failure taxonomy.
///
/// `Spawn` and `Pattern` are infrastructure problems and must never be read
/// as a race verdict; only `Mismatch` is a test failure.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The child process could not be launched at all.
    #[error("failed to launch child process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// An expectation carried a regex that does not compile.
    #[error("invalid expectation pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The child ran to completion but its exit code or output did not
    /// satisfy the expected outcome. Carries a bounded excerpt, not the
    /// full dump.
    #[error(
        "classification mismatch for '{scenario}': {requirement} (exit code: {exit_code:?})\n\
         --- output excerpt ---\n{excerpt}"
    )]
    Mismatch {
        scenario: String,
        requirement: String,
        exit_code: Option<i32>,
        excerpt: String,
    },
}

impl HarnessError {
    /// True for errors that indicate a broken environment rather than a
    /// test outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::Pattern { .. })
    }
}

/// An operation panicked inside a harness-managed thread.
///
/// Operation bodies are assumed never to panic under correct behavior, so
/// this always means the scenario itself is broken. The child entry point
/// turns it into a process abort with [`crate::DEFECT_EXIT_CODE`] so it can
/// never be mistaken for "no race found".
#[derive(Debug, Error)]
#[error("operation panicked in {role} thread of '{label}': {message}")]
pub struct ScenarioDefect {
    pub label: String,
    pub role: &'static str,
    pub message: String,
}
