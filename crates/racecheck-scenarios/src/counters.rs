//! Shared-counter scenarios: the canonical racy loop and its synchronized
//! counterparts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{ensure, Result};
use racecheck_harness::{run_symmetric, LOOPS};

use crate::{RacyCell, RunConfig};

/// Both threads bump the same counter with no synchronization. The final
/// value is unreliable and deliberately not asserted.
pub fn racy_counter(_config: &RunConfig) -> Result<()> {
    let x = RacyCell::new(0u64);
    run_symmetric("racy-counter", |_| unsafe {
        let p = x.get();
        p.write(p.read().wrapping_add(1));
    })?;
    println!("x = {}", unsafe { x.get().read() });
    Ok(())
}

/// The same read-modify-write wrapped in a mutex; here the final value is an
/// exact postcondition.
pub fn mutex_counter(_config: &RunConfig) -> Result<()> {
    let x = Mutex::new(0u64);
    run_symmetric("mutex-counter", |_| {
        *x.lock().unwrap() += 1;
    })?;
    let total = *x.lock().unwrap();
    ensure!(total == 2 * LOOPS as u64, "mutex lost updates: x = {total}");
    println!("x = {total}");
    Ok(())
}

/// Plain counter protected by a hand-rolled compare-exchange spinlock. The
/// detector must see the CAS pair as a lock.
pub fn spinlock_counter(_config: &RunConfig) -> Result<()> {
    let guard = AtomicU64::new(0);
    let x = RacyCell::new(0u64);
    run_symmetric("spinlock-counter", |_| {
        while guard
            .compare_exchange(0, 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        unsafe {
            let p = x.get();
            p.write(p.read() + 1);
        }
        guard.store(0, Ordering::Release);
    })?;
    let total = unsafe { x.get().read() };
    ensure!(total == 2 * LOOPS as u64, "spinlock lost updates: x = {total}");
    println!("x = {total}");
    Ok(())
}

/// Counter maintained entirely with atomic fetch-add.
pub fn atomic_counter(_config: &RunConfig) -> Result<()> {
    let x = AtomicU64::new(0);
    run_symmetric("atomic-counter", |_| {
        x.fetch_add(1, Ordering::Relaxed);
    })?;
    let total = x.load(Ordering::Relaxed);
    ensure!(total == 2 * LOOPS as u64, "atomic lost updates: x = {total}");
    println!("x = {total}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronized_counters_reach_the_exact_total() {
        let config = RunConfig::default();
        mutex_counter(&config).expect("mutex counter postcondition");
        spinlock_counter(&config).expect("spinlock counter postcondition");
        atomic_counter(&config).expect("atomic counter postcondition");
    }
}
