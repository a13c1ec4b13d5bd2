//! Host Runtime Collaboration
//!
//! The measurement protocol asks the host runtime to collect garbage before
//! every trial. Collection is a bounded-retry heuristic: it requests a
//! collection, then stops once heap occupancy has stopped changing and
//! nothing is waiting to be finalized. There is no completion guarantee, and
//! on some hosts every request is a no-op.

use crate::allocator;
use crate::measure::Timer;
use std::time::Duration;
use tracing::debug;

/// Capabilities of the runtime hosting the payload
pub trait HostRuntime {
    /// Ask the runtime to reclaim unreachable memory. Best effort.
    fn request_collection(&mut self);

    /// Current heap occupancy in bytes, if the runtime can report it
    fn heap_in_use(&self) -> Option<u64> {
        None
    }

    /// Whether objects are queued for finalization
    fn finalization_pending(&self) -> bool {
        false
    }
}

/// Runtime for native Rust payloads.
///
/// Collection hands freed allocator memory back to the OS where the platform
/// allocator supports it (`malloc_trim` on glibc). Heap occupancy comes from
/// [`TrackingAllocator`](crate::TrackingAllocator) when it is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRuntime;

impl HostRuntime for NativeRuntime {
    fn request_collection(&mut self) {
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        unsafe {
            libc::malloc_trim(0);
        }
    }

    fn heap_in_use(&self) -> Option<u64> {
        allocator::heap_in_use()
    }
}

/// Outcome of one forced collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    /// Collection requests issued
    pub attempts: u32,
    /// Whether occupancy settled before the attempt budget ran out
    pub stabilized: bool,
    /// Wall time spent collecting
    pub elapsed: Duration,
}

/// Force a collection, retrying up to `max_attempts` times.
///
/// Stops early once two consecutive occupancy readings agree and no
/// finalization is pending.
pub fn force_collection(runtime: &mut dyn HostRuntime, max_attempts: u32) -> CollectionReport {
    let timer = Timer::start();
    let mut previous = runtime.heap_in_use();
    let mut attempts = 0;
    let mut stabilized = false;

    while attempts < max_attempts {
        runtime.request_collection();
        attempts += 1;

        let occupancy = runtime.heap_in_use();
        if occupancy == previous && !runtime.finalization_pending() {
            stabilized = true;
            break;
        }
        previous = occupancy;
    }

    let elapsed = timer.stop();
    debug!(attempts, stabilized, ?elapsed, "forced collection");

    CollectionReport {
        attempts,
        stabilized,
        elapsed,
    }
}
