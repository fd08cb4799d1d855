//! Publication-ordering scenarios. These are the reason the alternating
//! paired discipline exists: each iteration needs known-good starting state,
//! and both start orders must be probed.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use anyhow::Result;
use racecheck_harness::{run_alternating_paired, run_symmetric};

use crate::{RacyCell, RunConfig};

/// The volatile-field publication pattern: two plain fields published
/// through two release stores, read after matching acquire spin-waits.
/// Every one of the 500 iterations must observe both published values.
pub fn publication(_config: &RunConfig) -> Result<()> {
    let flag_a = AtomicU8::new(0);
    let flag_b = AtomicU8::new(0);
    let data1 = RacyCell::new(0u32);
    let data2 = RacyCell::new(0u32);
    run_alternating_paired(
        "publication",
        |_| {
            flag_a.store(1, Ordering::SeqCst);
            flag_b.store(1, Ordering::SeqCst);
            unsafe {
                data1.get().write(0);
                data2.get().write(0);
            }
        },
        |_| {
            unsafe { data1.get().write(42) };
            flag_a.store(2, Ordering::Release);
            unsafe { data2.get().write(43) };
            flag_b.store(2, Ordering::Release);
        },
        |i| {
            while flag_a.load(Ordering::Acquire) != 2 {
                std::hint::spin_loop();
            }
            let v1 = unsafe { data1.get().read() };
            while flag_b.load(Ordering::Acquire) != 2 {
                std::hint::spin_loop();
            }
            let v2 = unsafe { data2.get().read() };
            if v1 != 42 || v2 != 43 {
                panic!("publication ordering violated at iteration {i}: {v1} {v2}");
            }
        },
    )?;
    Ok(())
}

/// Same shape with the release/acquire edge demoted to relaxed: the data
/// reads race with the data writes and must be reported.
pub fn racy_publication(_config: &RunConfig) -> Result<()> {
    let flag = AtomicU8::new(0);
    let data = RacyCell::new(0u32);
    run_alternating_paired(
        "racy-publication",
        |_| {
            flag.store(1, Ordering::SeqCst);
            unsafe { data.get().write(0) };
        },
        |_| {
            unsafe { data.get().write(42) };
            flag.store(2, Ordering::Relaxed);
        },
        |_| {
            while flag.load(Ordering::Relaxed) != 2 {
                std::hint::spin_loop();
            }
            let v = unsafe { data.get().read() };
            std::hint::black_box(v);
        },
    )?;
    Ok(())
}

struct Payload {
    value: u64,
}

/// Once-guarded lazy initialization: both threads race to initialize, the
/// loser observes the winner's fully built value.
pub fn lazy_init(_config: &RunConfig) -> Result<()> {
    let slot: OnceLock<Payload> = OnceLock::new();
    run_symmetric("lazy-init", |i| {
        let payload = slot.get_or_init(|| Payload { value: 99 });
        if i == 0 {
            // One print keeps the read observable without flooding output.
            println!("ignore: {}", payload.value);
        } else {
            std::hint::black_box(payload.value);
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_holds_for_every_paired_iteration() {
        // The reader panics on any ordering violation, which would surface
        // here as a defect.
        publication(&RunConfig::default()).expect("publication ordering");
    }

    #[test]
    fn lazy_init_always_observes_a_complete_payload() {
        lazy_init(&RunConfig::default()).expect("lazy init");
    }
}
