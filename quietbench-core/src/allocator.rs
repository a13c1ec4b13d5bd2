//! Heap Occupancy Tracking
//!
//! A pass-through global allocator that keeps a running count of live heap
//! bytes. [`NativeRuntime`](crate::NativeRuntime) reads it to decide when a
//! forced collection has stabilized the heap.
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: quietbench::TrackingAllocator = quietbench::TrackingAllocator;
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Global allocator that tracks live heap bytes on top of [`System`]
pub struct TrackingAllocator;

impl TrackingAllocator {
    #[inline]
    fn record_alloc(size: usize) {
        ACTIVE.store(true, Ordering::Relaxed);
        LIVE_BYTES.fetch_add(size as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_dealloc(size: usize) {
        // Saturating: frees of memory allocated before tracking began must not wrap.
        let _ = LIVE_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
            Some(live.saturating_sub(size as u64))
        });
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        Self::record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            Self::record_dealloc(layout.size());
            Self::record_alloc(new_size);
        }
        new_ptr
    }
}

/// Live heap bytes, or `None` when no [`TrackingAllocator`] has served an allocation
pub fn heap_in_use() -> Option<u64> {
    if ACTIVE.load(Ordering::Relaxed) {
        Some(LIVE_BYTES.load(Ordering::Relaxed))
    } else {
        None
    }
}
