//! Scenario catalog for the race-detector regression harness.
//!
//! Each scenario supplies operation bodies, a discipline, and an expected
//! verdict; the harness and verifier stay scenario-agnostic. A scenario is
//! data, not a subclass: name, discipline, expectation, optional child
//! flags, and a run function.

use std::cell::UnsafeCell;

use racecheck_harness::{Discipline, ExpectedOutcome, DEFECT_EXIT_CODE};

pub mod arrays;
pub mod counters;
pub mod misc;
pub mod publish;
pub mod raw;

/// Child-side tuning decoded from scenario extra flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Total allocation volume for `alloc-churn`, in MiB.
    pub churn_mb: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { churn_mb: 32 }
    }
}

/// The verdict a scenario is designed to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Exit 0, no race report in the output.
    Clean,
    /// The detector's distinguished report exit code.
    Flagged,
    /// The scenario aborts itself with the defect exit code.
    Defect,
}

impl Expect {
    pub fn as_str(self) -> &'static str {
        match self {
            Expect::Clean => "clean",
            Expect::Flagged => "flagged",
            Expect::Defect => "defect",
        }
    }
}

/// One registered scenario.
pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    pub discipline: Discipline,
    pub expect: Expect,
    /// Scenario-specific flags the verifier forwards to the child.
    pub extra_flags: &'static [&'static str],
    pub run: fn(&RunConfig) -> anyhow::Result<()>,
}

impl Scenario {
    /// The standard classification policy for this scenario's verdict.
    pub fn expected_outcome(&self) -> ExpectedOutcome {
        match self.expect {
            Expect::Clean => ExpectedOutcome::clean(),
            Expect::Flagged => ExpectedOutcome::flagged(),
            Expect::Defect => ExpectedOutcome::default().with_exit_code(DEFECT_EXIT_CODE),
        }
    }
}

pub fn all() -> &'static [Scenario] {
    REGISTRY
}

pub fn find(name: &str) -> Option<&'static Scenario> {
    REGISTRY.iter().find(|s| s.name == name)
}

macro_rules! scenario {
    ($name:expr, $summary:expr, $discipline:ident, $expect:ident, $run:path) => {
        scenario!($name, $summary, $discipline, $expect, &[], $run)
    };
    ($name:expr, $summary:expr, $discipline:ident, $expect:ident, $flags:expr, $run:path) => {
        Scenario {
            name: $name,
            summary: $summary,
            discipline: Discipline::$discipline,
            expect: Expect::$expect,
            extra_flags: $flags,
            run: $run,
        }
    };
}

static REGISTRY: &[Scenario] = &[
    scenario!(
        "racy-counter",
        "unsynchronized read-modify-write of a shared counter",
        Continuous,
        Flagged,
        counters::racy_counter
    ),
    scenario!(
        "mutex-counter",
        "the same counter guarded by a mutex",
        Continuous,
        Clean,
        counters::mutex_counter
    ),
    scenario!(
        "spinlock-counter",
        "counter guarded by a hand-rolled CAS spinlock",
        Continuous,
        Clean,
        counters::spinlock_counter
    ),
    scenario!(
        "atomic-counter",
        "counter maintained with atomic fetch-add",
        Continuous,
        Clean,
        counters::atomic_counter
    ),
    scenario!(
        "racy-byte-array",
        "unsynchronized increments of one byte-array element",
        Continuous,
        Flagged,
        arrays::racy_byte_array
    ),
    scenario!(
        "locked-byte-array",
        "byte-array increments under a mutex",
        Continuous,
        Clean,
        arrays::locked_byte_array
    ),
    scenario!(
        "disjoint-array",
        "each thread owns a distinct array element",
        Continuous,
        Clean,
        arrays::disjoint_array
    ),
    scenario!(
        "racy-raw-u8-put",
        "raw 1-byte write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u8_put
    ),
    scenario!(
        "racy-raw-u16-put",
        "raw 2-byte write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u16_put
    ),
    scenario!(
        "racy-raw-u32-put",
        "raw 4-byte write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u32_put
    ),
    scenario!(
        "racy-raw-u64-put",
        "raw 8-byte write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u64_put
    ),
    scenario!(
        "racy-raw-f32-put",
        "raw 4-byte float write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_f32_put
    ),
    scenario!(
        "racy-raw-f64-put",
        "raw 8-byte float write racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_f64_put
    ),
    scenario!(
        "racy-raw-u8-get",
        "raw 1-byte read racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u8_get
    ),
    scenario!(
        "racy-raw-u32-get",
        "raw 4-byte read racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u32_get
    ),
    scenario!(
        "racy-raw-u64-get",
        "raw 8-byte read racing a locked writer",
        Continuous,
        Flagged,
        raw::racy_raw_u64_get
    ),
    scenario!(
        "publication",
        "release/acquire publication of two plain fields",
        AlternatingPaired,
        Clean,
        publish::publication
    ),
    scenario!(
        "racy-publication",
        "the same publication with the ordering dropped",
        AlternatingPaired,
        Flagged,
        publish::racy_publication
    ),
    scenario!(
        "lazy-init",
        "once-guarded lazy initialization read from both threads",
        Continuous,
        Clean,
        publish::lazy_init
    ),
    scenario!(
        "string-ops",
        "thread-local string formatting and shared-literal hashing",
        Continuous,
        Clean,
        misc::string_ops
    ),
    scenario!(
        "alloc-churn",
        "allocation churn forcing address reuse across threads",
        Continuous,
        Clean,
        &["--churn-mb", "32"],
        misc::alloc_churn
    ),
    scenario!(
        "defect-probe",
        "deliberately panicking operation, proves the fatal-abort path",
        Continuous,
        Defect,
        misc::defect_probe
    ),
];

/// Shared mutable cell accessed through raw pointers: the moral equivalent
/// of the original suite's unsafe-memory helpers. Racy scenarios go through
/// this on purpose; it imposes no synchronization of its own.
pub(crate) struct RacyCell<T>(UnsafeCell<T>);

// Scenario state is confined to one harness call; cross-thread access is
// exactly what the scenarios probe.
unsafe impl<T: Send> Sync for RacyCell<T> {}

impl<T> RacyCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    pub(crate) fn get(&self) -> *mut T {
        self.0.get()
    }
}
