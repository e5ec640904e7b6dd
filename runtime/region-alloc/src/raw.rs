//! Byte-level region access
//!
//! Shared by [`RegionAllocator`](crate::RegionAllocator), its
//! `allocator_api2` implementation, and type-erased holders that only know
//! the layout of what they release.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::{Region, RegionError, Result};

/// Dangling, well-aligned pointer for zero-byte blocks
#[inline]
pub fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignment is never zero
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

/// Allocate a block for `layout` from region `R`
///
/// Zero-byte layouts never reach the region and yield [`dangling`].
///
/// # Errors
/// - [`RegionError::UnsupportedAlignment`] if `R` cannot honour the alignment
/// - [`RegionError::OutOfMemory`] if the region primitive reports exhaustion
pub fn allocate<R: Region>(layout: Layout) -> Result<NonNull<u8>> {
    if layout.size() == 0 {
        return Ok(dangling(layout));
    }

    if layout.align() > R::MAX_ALIGN {
        return Err(RegionError::UnsupportedAlignment {
            align: layout.align(),
            max: R::MAX_ALIGN,
        });
    }

    let ptr = NonNull::new(R::region_alloc(layout)).ok_or(RegionError::OutOfMemory {
        requested: layout.size(),
    })?;

    log::trace!(
        "region {}: allocated {} bytes at {:p}",
        R::NAME,
        layout.size(),
        ptr
    );
    Ok(ptr)
}

/// Release a block obtained from [`allocate`]
///
/// Zero-byte blocks are a no-op.
///
/// # Safety
/// Caller must ensure:
/// - `ptr` was returned by [`allocate`] with the same region and layout
/// - `ptr` has not been released already
pub unsafe fn deallocate<R: Region>(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() == 0 {
        return;
    }

    log::trace!(
        "region {}: releasing {} bytes at {:p}",
        R::NAME,
        layout.size(),
        ptr
    );
    unsafe { R::region_free(ptr.as_ptr(), layout) }
}
