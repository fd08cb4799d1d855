//! Two-thread interleaving disciplines.
//!
//! Scenarios hand over one or two operation closures and pick a discipline:
//!
//! - [`run_continuous`]: both operations loop [`LOOPS`] times in two
//!   long-lived threads with no cross-thread ordering beyond "concurrent
//!   from start to join". Maximizes the number of racing accesses per run.
//! - [`run_alternating_paired`]: [`LOOPS_SYNC`] iterations, each with a
//!   single-threaded setup step, a fresh thread pair, and a start order that
//!   alternates by iteration parity so both first-writer orderings are
//!   probed. Used when a scenario depends on a specific publication
//!   ordering the continuous discipline cannot exercise from both sides.
//!
//! Panics in harness threads are captured at join and returned as
//! [`ScenarioDefect`]; the caller decides how to abort, there is no ambient
//! handler and no recovery.

use std::any::Any;
use std::thread;

use crate::error::ScenarioDefect;

/// Iterations per thread in the continuous discipline.
pub const LOOPS: usize = 50_000;
/// Iterations in the alternating-paired discipline.
pub const LOOPS_SYNC: usize = 500;
/// Child exit status for a scenario defect (an operation panicked).
pub const DEFECT_EXIT_CODE: i32 = 3;

/// The interleaving shape a scenario selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Continuous,
    AlternatingPaired,
}

impl Discipline {
    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Continuous => "continuous",
            Discipline::AlternatingPaired => "alternating-paired",
        }
    }
}

/// Run `primary` and `secondary` for [`LOOPS`] iterations each in two
/// concurrent threads, then join both.
///
/// The iteration index is passed to every invocation. No ordering is
/// promised between the two threads' iterations.
pub fn run_continuous<P, S>(label: &str, primary: P, secondary: S) -> Result<(), ScenarioDefect>
where
    P: Fn(usize) + Sync,
    S: Fn(usize) + Sync,
{
    eprintln!("Begin {label}");
    let outcome = thread::scope(|s| {
        let t1 = s.spawn(|| {
            for i in 0..LOOPS {
                primary(i);
            }
        });
        let t2 = s.spawn(|| {
            for i in 0..LOOPS {
                secondary(i);
            }
        });
        join_pair(label, t1.join(), t2.join())
    });
    eprintln!("End   {label}");
    outcome
}

/// [`run_continuous`] with the same operation in both threads.
pub fn run_symmetric<F>(label: &str, op: F) -> Result<(), ScenarioDefect>
where
    F: Fn(usize) + Sync,
{
    run_continuous(label, &op, &op)
}

/// For [`LOOPS_SYNC`] iterations: run `setup(i)` on the calling thread,
/// spawn a fresh pair bound to `primary(i)` and `secondary(i)`, and join
/// both before the next iteration.
///
/// The primary thread is started first on even iterations and second on odd
/// ones, so both possible first-writer orderings are exercised. Setup always
/// completes before either thread of its iteration starts, and no thread
/// outlives its iteration's join.
pub fn run_alternating_paired<T, P, S>(
    label: &str,
    mut setup: T,
    primary: P,
    secondary: S,
) -> Result<(), ScenarioDefect>
where
    T: FnMut(usize),
    P: Fn(usize) + Sync,
    S: Fn(usize) + Sync,
{
    eprintln!("Begin {label}");
    for i in 0..LOOPS_SYNC {
        setup(i);
        thread::scope(|s| {
            if primary_starts_first(i) {
                let t1 = s.spawn(|| primary(i));
                let t2 = s.spawn(|| secondary(i));
                join_pair(label, t1.join(), t2.join())
            } else {
                let t2 = s.spawn(|| secondary(i));
                let t1 = s.spawn(|| primary(i));
                join_pair(label, t1.join(), t2.join())
            }
        })?;
    }
    eprintln!("End   {label}");
    Ok(())
}

/// Start-order parity rule for the alternating-paired discipline.
pub fn primary_starts_first(iteration: usize) -> bool {
    iteration % 2 == 0
}

fn join_pair(
    label: &str,
    primary: thread::Result<()>,
    secondary: thread::Result<()>,
) -> Result<(), ScenarioDefect> {
    for (role, joined) in [("primary", primary), ("secondary", secondary)] {
        if let Err(payload) = joined {
            return Err(ScenarioDefect {
                label: label.to_string(),
                role,
                message: panic_message(payload),
            });
        }
    }
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn continuous_runs_each_operation_exactly_loops_times() {
        let first = AtomicUsize::new(0);
        let second = AtomicUsize::new(0);
        run_continuous(
            "count-check",
            |_| {
                first.fetch_add(1, Ordering::Relaxed);
            },
            |_| {
                second.fetch_add(1, Ordering::Relaxed);
            },
        )
        .expect("no defect");
        assert_eq!(first.load(Ordering::Relaxed), LOOPS);
        assert_eq!(second.load(Ordering::Relaxed), LOOPS);
    }

    #[test]
    fn symmetric_runs_the_operation_in_both_threads() {
        let count = AtomicUsize::new(0);
        run_symmetric("symmetric-check", |_| {
            count.fetch_add(1, Ordering::Relaxed);
        })
        .expect("no defect");
        assert_eq!(count.load(Ordering::Relaxed), 2 * LOOPS);
    }

    #[test]
    fn continuous_passes_the_iteration_index_through() {
        let max_seen = AtomicUsize::new(0);
        run_continuous(
            "index-check",
            |i| {
                max_seen.fetch_max(i, Ordering::Relaxed);
            },
            |_| {},
        )
        .expect("no defect");
        assert_eq!(max_seen.load(Ordering::Relaxed), LOOPS - 1);
    }

    #[test]
    fn start_order_splits_evenly_by_parity() {
        let primary_first = (0..LOOPS_SYNC).filter(|&i| primary_starts_first(i)).count();
        assert_eq!(primary_first, LOOPS_SYNC / 2);
        assert_eq!(LOOPS_SYNC - primary_first, LOOPS_SYNC / 2);
    }

    #[test]
    fn paired_threads_never_observe_pre_setup_state() {
        // Setup publishes i + 1; both threads must read exactly that value
        // for their own iteration.
        let sentinel = AtomicUsize::new(0);
        let stale_read = AtomicBool::new(false);
        let runs = AtomicUsize::new(0);
        run_alternating_paired(
            "setup-order-check",
            |i| sentinel.store(i + 1, Ordering::SeqCst),
            |i| {
                runs.fetch_add(1, Ordering::Relaxed);
                if sentinel.load(Ordering::SeqCst) != i + 1 {
                    stale_read.store(true, Ordering::Relaxed);
                }
            },
            |i| {
                if sentinel.load(Ordering::SeqCst) != i + 1 {
                    stale_read.store(true, Ordering::Relaxed);
                }
            },
        )
        .expect("no defect");
        assert_eq!(runs.load(Ordering::Relaxed), LOOPS_SYNC);
        assert!(!stale_read.load(Ordering::Relaxed));
    }

    #[test]
    fn panicking_operation_surfaces_as_defect() {
        let err = run_continuous(
            "defect-check",
            |i| {
                if i == 10 {
                    panic!("intentional operation failure");
                }
            },
            |_| {},
        )
        .expect_err("primary panic must surface");
        assert_eq!(err.role, "primary");
        assert_eq!(err.label, "defect-check");
        assert!(err.message.contains("intentional operation failure"));
    }

    #[test]
    fn paired_defect_stops_the_iteration_loop() {
        let iterations = AtomicUsize::new(0);
        let err = run_alternating_paired(
            "paired-defect-check",
            |_| {
                iterations.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
            |i| {
                if i == 3 {
                    panic!("secondary gave up");
                }
            },
        )
        .expect_err("secondary panic must surface");
        assert_eq!(err.role, "secondary");
        // Setup ran for the failing iteration but not past it.
        assert_eq!(iterations.load(Ordering::SeqCst), 4);
    }
}
