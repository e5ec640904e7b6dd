//! Instrumented fake region for tests
//!
//! Blocks come from the global heap; every allocation and release is
//! recorded in per-thread counters so concurrently running tests do not
//! observe each other. A byte budget can be set to provoke exhaustion.

use core::alloc::Layout;
use core::cell::RefCell;
use std::collections::BTreeMap;

use crate::Region;

/// Snapshot of the mock region's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    /// Blocks handed out and not yet released
    pub live_blocks: usize,
    /// Bytes handed out and not yet released
    pub live_bytes: usize,
    /// Successful allocations since the last reset
    pub allocs: usize,
    /// Releases since the last reset
    pub frees: usize,
    /// Size of the most recent request, successful or not
    pub last_request: Option<usize>,
}

#[derive(Default)]
struct MockState {
    blocks: BTreeMap<usize, usize>,
    stats: RegionStats,
    budget: Option<usize>,
}

std::thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::default());
}

/// Region that records every request made through it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MockRegion;

unsafe impl Region for MockRegion {
    const NAME: &'static str = "mock";
    const MAX_ALIGN: usize = 64;

    fn region_alloc(layout: Layout) -> *mut u8 {
        STATE.with(|state| {
            let mut state = state.borrow_mut();
            state.stats.last_request = Some(layout.size());

            if let Some(budget) = state.budget {
                if state.stats.live_bytes + layout.size() > budget {
                    return core::ptr::null_mut();
                }
            }

            // SAFETY: the region contract forbids zero-sized layouts
            let ptr = unsafe { std::alloc::alloc(layout) };
            if !ptr.is_null() {
                state.blocks.insert(ptr as usize, layout.size());
                state.stats.live_blocks += 1;
                state.stats.live_bytes += layout.size();
                state.stats.allocs += 1;
            }
            ptr
        })
    }

    unsafe fn region_free(ptr: *mut u8, layout: Layout) {
        STATE.with(|state| {
            let mut state = state.borrow_mut();
            let size = match state.blocks.remove(&(ptr as usize)) {
                Some(size) => size,
                None => panic!("mock region: release of unknown block {ptr:p}"),
            };
            state.stats.live_blocks -= 1;
            state.stats.live_bytes -= size;
            state.stats.frees += 1;
        });
        unsafe { std::alloc::dealloc(ptr, layout) }
    }
}

/// Current counters for this thread
pub fn stats() -> RegionStats {
    STATE.with(|state| state.borrow().stats)
}

/// Clear counters and budget for this thread
///
/// Blocks still live are forgotten by the counters, not released.
pub fn reset() {
    STATE.with(|state| *state.borrow_mut() = MockState::default());
}

/// Cap the live bytes this thread may hold; `None` removes the cap
pub fn set_budget(budget: Option<usize>) {
    STATE.with(|state| state.borrow_mut().budget = budget);
}
