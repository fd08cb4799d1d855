//! Array-element scenarios: races and non-races on indexed storage.

use std::sync::Mutex;

use anyhow::{ensure, Result};
use racecheck_harness::{run_continuous, run_symmetric, LOOPS};

use crate::{RacyCell, RunConfig};

/// Both threads increment element 0 of a shared byte array with no
/// synchronization: a 1-byte racing access.
pub fn racy_byte_array(_config: &RunConfig) -> Result<()> {
    let x = RacyCell::new([0u8; 2]);
    run_symmetric("racy-byte-array", |_| unsafe {
        let p = x.get().cast::<u8>();
        p.write(p.read().wrapping_add(1));
    })?;
    println!("x[0] = {}", unsafe { x.get().cast::<u8>().read() });
    Ok(())
}

/// The same element increment under a mutex.
pub fn locked_byte_array(_config: &RunConfig) -> Result<()> {
    let x = Mutex::new([0u8; 2]);
    run_symmetric("locked-byte-array", |_| {
        let mut arr = x.lock().unwrap();
        arr[0] = arr[0].wrapping_add(1);
    })?;
    let first = x.lock().unwrap()[0];
    let expected = ((2 * LOOPS) % 256) as u8;
    ensure!(first == expected, "locked array lost updates: x[0] = {first}");
    println!("x[0] = {first}");
    Ok(())
}

/// Primary owns element 0, secondary owns element 1: adjacent but disjoint
/// addresses, so there is nothing to report.
pub fn disjoint_array(_config: &RunConfig) -> Result<()> {
    let x = RacyCell::new([0u64; 2]);
    run_continuous(
        "disjoint-array",
        |_| unsafe {
            let p = x.get().cast::<u64>();
            p.write(p.read() + 1);
        },
        |_| unsafe {
            let p = x.get().cast::<u64>().add(1);
            p.write(p.read() + 1);
        },
    )?;
    let (first, second) = unsafe {
        let p = x.get().cast::<u64>();
        (p.read(), p.add(1).read())
    };
    ensure!(
        first == LOOPS as u64 && second == LOOPS as u64,
        "disjoint elements lost updates: {first} {second}"
    );
    println!("x = [{first}, {second}]");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_racy_array_scenarios_hold_their_postconditions() {
        let config = RunConfig::default();
        locked_byte_array(&config).expect("locked byte array");
        disjoint_array(&config).expect("disjoint array");
    }
}
