//! Regression harness for a ThreadSanitizer-style dynamic race detector.
//!
//! The detector itself lives in the instrumented build of the program under
//! test; this crate only manufactures controlled concurrent executions and
//! judges what the detector said about them. Two facilities:
//!
//! - [`interleave`]: deterministic two-thread interleaving of scenario
//!   operations inside the child process.
//! - [`verify`]: out-of-process launch of a child entry point, capture of its
//!   exit status and output, and classification against an expected outcome.
//!
//! Scenario bodies are supplied by callers (see the `racecheck-scenarios`
//! crate); nothing here knows what any particular scenario does.

pub mod error;
pub mod interleave;
pub mod outcome;
pub mod verify;

pub use error::{HarnessError, ScenarioDefect};
pub use interleave::{
    primary_starts_first, run_alternating_paired, run_continuous, run_symmetric, Discipline,
    DEFECT_EXIT_CODE, LOOPS, LOOPS_SYNC,
};
pub use outcome::{
    CapturedResult, ExpectedOutcome, OUTPUT_EXCERPT_MAX, REPORT_EXIT_CODE, REPORT_MARKER,
};
pub use verify::{Verifier, CHILD_ARGS_ENV, DETECTOR_FLAG};
