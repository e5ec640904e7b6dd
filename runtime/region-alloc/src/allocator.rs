//! Typed allocator over a region
//!
//! [`RegionAllocator`] keeps raw storage acquisition (`allocate` /
//! `deallocate`) separate from object lifetime (`construct` / `destroy`), so
//! containers can hold capacity beyond their live elements.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};
use static_assertions::{assert_eq_size, assert_impl_all};

use crate::{raw, DefaultRegion, Region, RegionError, Result};

/// Stateless allocator for `T` drawing from region `R`
///
/// Instances carry no data. Any two allocators over the same region are
/// interchangeable, whatever their element type: a block allocated through
/// one may be released through another.
pub struct RegionAllocator<T, R = DefaultRegion> {
    _marker: PhantomData<(fn() -> T, fn() -> R)>,
}

assert_eq_size!(RegionAllocator<u64, crate::SystemRegion>, ());
assert_impl_all!(
    RegionAllocator<alloc::string::String, crate::SystemRegion>: Copy, Send, Sync, Default, Eq
);

impl<T, R: Region> RegionAllocator<T, R> {
    /// Create an allocator
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Allocate uninitialized storage for `n` values of `T`
    ///
    /// A zero-byte request returns a dangling, aligned pointer without
    /// touching the region.
    ///
    /// # Errors
    /// - [`RegionError::Overflow`] if `n * size_of::<T>()` is not representable;
    ///   the region is not called
    /// - [`RegionError::UnsupportedAlignment`] if `T` is over-aligned for `R`
    /// - [`RegionError::OutOfMemory`] if the region is exhausted
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>> {
        let layout = Layout::array::<T>(n).map_err(|_| RegionError::Overflow {
            count: n,
            elem_size: mem::size_of::<T>(),
        })?;

        raw::allocate::<R>(layout).map(NonNull::cast)
    }

    /// Release storage obtained from [`RegionAllocator::allocate`]
    ///
    /// Values in the block are not dropped. Zero-byte blocks are a no-op.
    ///
    /// # Safety
    /// Caller must ensure:
    /// - `ptr` was returned by `allocate(n)` on an allocator over the same region
    /// - `ptr` has not been released already
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if let Ok(layout) = Layout::array::<T>(n) {
            unsafe { raw::deallocate::<R>(ptr.cast(), layout) }
        }
    }

    /// Move `value` into the uninitialized slot at `ptr`
    ///
    /// # Safety
    /// `ptr` must point to valid, uninitialized storage for one `T`.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        unsafe { ptr.as_ptr().write(value) }
    }

    /// Drop the value at `ptr` in place, keeping its storage
    ///
    /// # Safety
    /// `ptr` must hold a live `T`, which must not be used afterwards.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        unsafe { ptr::drop_in_place(ptr.as_ptr()) }
    }

    /// Allocate one slot and construct the value produced by `init` in it
    ///
    /// If `init` panics the slot is released before the panic continues.
    pub fn emplace<F>(&self, init: F) -> Result<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let ptr = self.allocate(1)?;
        let guard = SlotGuard::<T, R> {
            ptr,
            _region: PhantomData,
        };
        let value = init();
        mem::forget(guard);

        unsafe { self.construct(ptr, value) };
        Ok(ptr)
    }

    /// The allocator for `U` over the same region
    pub fn rebind<U>(self) -> RegionAllocator<U, R> {
        RegionAllocator::new()
    }
}

/// Releases an allocated but unconstructed slot on unwind
struct SlotGuard<T, R: Region> {
    ptr: NonNull<T>,
    _region: PhantomData<fn() -> R>,
}

impl<T, R: Region> Drop for SlotGuard<T, R> {
    fn drop(&mut self) {
        unsafe { RegionAllocator::<T, R>::new().deallocate(self.ptr, 1) }
    }
}

/// Allocators that can produce their counterpart for another element type
///
/// Containers allocate internal node types that differ from their element
/// type; the rebound allocator must draw from the same source.
pub trait Rebind {
    /// Element type this allocator is typed for
    type Value;

    /// The same allocator family typed for `U`
    type Other<U>: Rebind<Value = U>;

    fn rebind<U>(&self) -> Self::Other<U>;
}

impl<T, R: Region> Rebind for RegionAllocator<T, R> {
    type Value = T;
    type Other<U> = RegionAllocator<U, R>;

    fn rebind<U>(&self) -> RegionAllocator<U, R> {
        RegionAllocator::new()
    }
}

impl<T, R: Region> Clone for RegionAllocator<T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R: Region> Copy for RegionAllocator<T, R> {}

impl<T, R: Region> Default for RegionAllocator<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U, R: Region> PartialEq<RegionAllocator<U, R>> for RegionAllocator<T, R> {
    fn eq(&self, _other: &RegionAllocator<U, R>) -> bool {
        true
    }
}

impl<T, R: Region> Eq for RegionAllocator<T, R> {}

impl<T, R: Region> fmt::Debug for RegionAllocator<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionAllocator")
            .field("region", &R::NAME)
            .field("value", &core::any::type_name::<T>())
            .finish()
    }
}

// Byte-level requests go to the same region whatever `T` is, so containers
// may allocate any internal layout through an allocator typed for their element.
unsafe impl<T, R: Region> Allocator for RegionAllocator<T, R> {
    fn allocate(&self, layout: Layout) -> core::result::Result<NonNull<[u8]>, AllocError> {
        let ptr = raw::allocate::<R>(layout).map_err(|_| AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { raw::deallocate::<R>(ptr, layout) }
    }
}
