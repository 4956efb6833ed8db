//! Counts live heap allocations made by the current thread.
//!
//! Install [`CountingAllocator`] as the global allocator of a test binary, then compare
//! [`live`] before and after the code under test:
//!
//! ```ignore
//! use tabula_testhelpers::alloc_tracker::{CountingAllocator, live};
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator;
//!
//! let before = live();
//! drop(vec![1, 2, 3]);
//! assert_eq!(live(), before);
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Allocations made minus allocations freed on this thread so far.
///
/// Only meaningful when [`CountingAllocator`] is the global allocator. Memory freed on
/// another thread than the one that allocated it skews both counts.
pub fn live() -> isize {
    LIVE.with(Cell::get)
}

fn bump(delta: isize) {
    // the slot is gone while the thread shuts down
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

/// Forwards to [`System`], counting allocations and deallocations per thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

// SAFETY: every call is forwarded unchanged to `System`
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            bump(1);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            bump(1);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        bump(-1);
        unsafe { System.dealloc(ptr, layout) }
    }

    // a resized block is still one allocation
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}
