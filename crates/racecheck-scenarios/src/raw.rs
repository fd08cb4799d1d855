//! Raw-pointer scenarios covering the detector's access-size reporting.
//!
//! Shape taken from the original unsafe-memory loops: the primary thread
//! mutates a field under a lock, the secondary touches the same field
//! through a raw pointer with no synchronization. One scenario per access
//! width so a report's "of size N" line can be checked for each.

use std::sync::Mutex;

use anyhow::Result;
use racecheck_harness::run_continuous;

use crate::{RacyCell, RunConfig};

macro_rules! racy_raw_put {
    ($fn_name:ident, $label:expr, $ty:ty, $bump:expr) => {
        pub fn $fn_name(_config: &RunConfig) -> Result<()> {
            let lock = Mutex::new(());
            let x = RacyCell::new(<$ty>::default());
            let bump = $bump;
            run_continuous(
                $label,
                |_| {
                    let _guard = lock.lock().unwrap();
                    unsafe {
                        let p = x.get();
                        p.write(bump(p.read()));
                    }
                },
                |_| {
                    let seen = {
                        let _guard = lock.lock().unwrap();
                        unsafe { x.get().read() }
                    };
                    // The write happens after the lock is released.
                    unsafe { x.get().write(bump(seen)) };
                },
            )?;
            println!("x = {:?}", unsafe { x.get().read() });
            Ok(())
        }
    };
}

macro_rules! racy_raw_get {
    ($fn_name:ident, $label:expr, $ty:ty, $bump:expr) => {
        pub fn $fn_name(_config: &RunConfig) -> Result<()> {
            let lock = Mutex::new(());
            let x = RacyCell::new(<$ty>::default());
            let bump = $bump;
            run_continuous(
                $label,
                |_| {
                    let _guard = lock.lock().unwrap();
                    unsafe {
                        let p = x.get();
                        p.write(bump(p.read()));
                    }
                },
                |_| {
                    let seen = unsafe { x.get().read() };
                    std::hint::black_box(seen);
                },
            )?;
            println!("x = {:?}", unsafe { x.get().read() });
            Ok(())
        }
    };
}

racy_raw_put!(racy_raw_u8_put, "racy-raw-u8-put", u8, |v: u8| v.wrapping_add(1));
racy_raw_put!(racy_raw_u16_put, "racy-raw-u16-put", u16, |v: u16| v.wrapping_add(1));
racy_raw_put!(racy_raw_u32_put, "racy-raw-u32-put", u32, |v: u32| v.wrapping_add(1));
racy_raw_put!(racy_raw_u64_put, "racy-raw-u64-put", u64, |v: u64| v.wrapping_add(1));
racy_raw_put!(racy_raw_f32_put, "racy-raw-f32-put", f32, |v: f32| v + 1.0);
racy_raw_put!(racy_raw_f64_put, "racy-raw-f64-put", f64, |v: f64| v + 1.0);

racy_raw_get!(racy_raw_u8_get, "racy-raw-u8-get", u8, |v: u8| v.wrapping_add(1));
racy_raw_get!(racy_raw_u32_get, "racy-raw-u32-get", u32, |v: u32| v.wrapping_add(1));
racy_raw_get!(racy_raw_u64_get, "racy-raw-u64-get", u64, |v: u64| v.wrapping_add(1));
