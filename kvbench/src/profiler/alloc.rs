use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static TOTAL_BYTES: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);

/// Global allocator that counts heap traffic on top of the system allocator.
///
/// The profiler reads its counters to report live heap, cumulative allocation
/// and number of frees. It only sees allocations once a binary installs it:
///
/// ```rust,ignore
/// use kvbench::profiler::TrackingAllocator;
///
/// #[global_allocator]
/// static ALLOCATOR: TrackingAllocator = TrackingAllocator;
/// ```
///
/// Without it all three counters stay at zero.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        record_free(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            // counted as a free of the old block and a fresh allocation
            record_free(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

#[inline]
fn record_alloc(size: usize) {
    LIVE_BYTES.fetch_add(size as u64, Ordering::Relaxed);
    TOTAL_BYTES.fetch_add(size as u64, Ordering::Relaxed);
}

#[inline]
fn record_free(size: usize) {
    LIVE_BYTES.fetch_sub(size as u64, Ordering::Relaxed);
    FREES.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time copy of the allocator counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationCounters {
    /// Bytes currently allocated on the heap.
    pub live_bytes: u64,
    /// Bytes allocated since process start, never decreasing.
    pub total_bytes: u64,
    /// Number of heap blocks released since process start.
    pub frees: u64,
}

pub fn allocation_counters() -> AllocationCounters {
    AllocationCounters {
        live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
        total_bytes: TOTAL_BYTES.load(Ordering::Relaxed),
        frees: FREES.load(Ordering::Relaxed),
    }
}

/// Whether a [`TrackingAllocator`] has seen any allocation in this process.
pub fn is_tracking() -> bool {
    TOTAL_BYTES.load(Ordering::Relaxed) > 0
}
