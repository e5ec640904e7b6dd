//! Raw region primitives
//!
//! A [`Region`] is the black-box allocate/free pair the host platform
//! supplies for its secondary memory bank. It is a type-level policy: no
//! instance state, so every allocator parameterized by it stays zero-sized.

use core::alloc::Layout;

/// Raw allocate/free pair backing a memory region
///
/// # Safety
/// Implementors must return either null or a pointer to at least
/// `layout.size()` writable bytes aligned to `layout.align()` whenever
/// `layout.align() <= MAX_ALIGN`, and the block must stay valid until it is
/// passed to [`Region::region_free`].
pub unsafe trait Region: 'static {
    /// Backend name, used in logs
    const NAME: &'static str;

    /// Largest alignment the primitive guarantees for every block
    const MAX_ALIGN: usize;

    /// Allocate `layout.size()` bytes, returning null on exhaustion
    ///
    /// Never called with a zero size.
    fn region_alloc(layout: Layout) -> *mut u8;

    /// Release a block previously returned by [`Region::region_alloc`]
    ///
    /// The layout is the one used at allocation time. Primitives that do
    /// not track sizes are free to ignore it.
    ///
    /// # Safety
    /// `ptr` must come from `region_alloc` of the same region and must not
    /// have been released already.
    unsafe fn region_free(ptr: *mut u8, layout: Layout);
}

/// Region served by the global heap
///
/// Used on hosts and boards without a secondary bank, so region-backed
/// code runs unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemRegion;

unsafe impl Region for SystemRegion {
    const NAME: &'static str = "system";
    const MAX_ALIGN: usize = 1 << 29;

    fn region_alloc(layout: Layout) -> *mut u8 {
        // SAFETY: callers never pass a zero-sized layout
        unsafe { alloc::alloc::alloc(layout) }
    }

    unsafe fn region_free(ptr: *mut u8, layout: Layout) {
        unsafe { alloc::alloc::dealloc(ptr, layout) }
    }
}

#[cfg(feature = "external")]
mod external {
    use core::ffi::c_void;

    extern "C" {
        /// Board allocation entry for the secondary bank (e.g. `ps_malloc`)
        pub fn region_alloc(size: usize) -> *mut c_void;

        /// Board release entry for the secondary bank
        pub fn region_free(ptr: *mut c_void);
    }
}

/// Region backed by the board's `region_alloc`/`region_free` symbols
///
/// The board support package links these, typically as thin wrappers
/// around its external RAM heap. Only the byte count is forwarded; the
/// primitive is assumed to give malloc-style alignment.
#[cfg(feature = "external")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExternRegion;

#[cfg(feature = "external")]
unsafe impl Region for ExternRegion {
    const NAME: &'static str = "external";
    const MAX_ALIGN: usize = 2 * core::mem::size_of::<usize>();

    fn region_alloc(layout: Layout) -> *mut u8 {
        unsafe { external::region_alloc(layout.size()).cast() }
    }

    unsafe fn region_free(ptr: *mut u8, _layout: Layout) {
        unsafe { external::region_free(ptr.cast()) }
    }
}

/// Region used when none is named explicitly
#[cfg(feature = "external")]
pub type DefaultRegion = ExternRegion;

/// Region used when none is named explicitly
#[cfg(not(feature = "external"))]
pub type DefaultRegion = SystemRegion;
