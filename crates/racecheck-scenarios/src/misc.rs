//! Scenarios probing runtime machinery rather than user synchronization:
//! allocator address reuse, thread-local-only work, and the harness's own
//! defect path.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use anyhow::{ensure, Result};
use racecheck_harness::{run_symmetric, LOOPS};
use tracing::debug;

use crate::RunConfig;

const SHARED_LITERAL: &str = "hi";

/// Per-thread string formatting plus hashing of a shared literal: nothing
/// here is writable cross-thread, so nothing may be reported.
pub fn string_ops(_config: &RunConfig) -> Result<()> {
    run_symmetric("string-ops", |i| {
        let local = format!("{SHARED_LITERAL}-{i}");
        let mut hasher = DefaultHasher::new();
        SHARED_LITERAL.hash(&mut hasher);
        local.hash(&mut hasher);
        std::hint::black_box(hasher.finish());
    })?;
    Ok(())
}

/// Allocate and publish short-lived buffers so freed addresses get reused by
/// the other thread. Address reuse must not confuse the detector into
/// pairing accesses to different objects. Sized so the two threads together
/// churn through four times `churn_mb` MiB.
pub fn alloc_churn(config: &RunConfig) -> Result<()> {
    let bytes_per_iteration =
        ((config.churn_mb * 1024 * 1024 * 4) / 2 / LOOPS as u64).max(1) as usize;
    debug!(churn_mb = config.churn_mb, bytes_per_iteration, "sized churn buffers");
    let slot: Mutex<Vec<u8>> = Mutex::new(Vec::new());
    run_symmetric("alloc-churn", |_| {
        let mut buffer = vec![0u8; bytes_per_iteration];
        for byte in &mut buffer {
            *byte = 42;
        }
        *slot.lock().unwrap() = buffer;
    })?;
    let last = slot.lock().unwrap();
    ensure!(last.first() == Some(&42), "published buffer was not filled");
    println!("array[0] = {}", last[0]);
    Ok(())
}

/// Panics partway through on purpose. Proves that an operation failure
/// aborts the child with the defect exit code instead of dissolving into a
/// "no race found" verdict.
pub fn defect_probe(_config: &RunConfig) -> Result<()> {
    run_symmetric("defect-probe", |i| {
        if i == 1000 {
            panic!("defect probe tripped as designed");
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_churn_scales_with_the_flag_and_fills_buffers() {
        let config = RunConfig { churn_mb: 2 };
        alloc_churn(&config).expect("alloc churn");
    }

    #[test]
    fn defect_probe_reports_a_scenario_defect() {
        let err = defect_probe(&RunConfig::default()).expect_err("must trip");
        assert!(err.to_string().contains("defect probe tripped"));
    }
}
