use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use static_assertions::assert_impl_all;

use crate::{DefaultRegion, Region, RegionAllocator, Result};

/// A single value placed in region storage
///
/// Owns its slot exclusively: dropping the box destroys the value, then
/// releases the storage.
pub struct RegionBox<T, R: Region = DefaultRegion> {
    ptr: NonNull<T>,
    _owns: PhantomData<(T, fn() -> R)>,
}

// SAFETY: the box owns its value exclusively, as `Box<T>` does
unsafe impl<T: Send, R: Region> Send for RegionBox<T, R> {}
// SAFETY: `&RegionBox<T, R>` only hands out `&T`
unsafe impl<T: Sync, R: Region> Sync for RegionBox<T, R> {}

assert_impl_all!(RegionBox<u64, crate::SystemRegion>: Send, Sync);

impl<T, R: Region> RegionBox<T, R> {
    /// Move `value` into region storage
    pub fn new(value: T) -> Result<Self> {
        Self::new_with(|| value)
    }

    /// Construct the value in region storage once the slot is acquired
    ///
    /// If `init` panics the slot is released.
    pub fn new_with<F>(init: F) -> Result<Self>
    where
        F: FnOnce() -> T,
    {
        let ptr = RegionAllocator::<T, R>::new().emplace(init)?;
        Ok(Self {
            ptr,
            _owns: PhantomData,
        })
    }

    pub fn get(&self) -> &T {
        // SAFETY: the slot holds a live value for as long as the box exists
        unsafe { self.ptr.as_ref() }
    }

    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: the slot holds a live value, and `&mut self` makes this the only borrow
        unsafe { self.ptr.as_mut() }
    }

    /// Move the value out and release its storage
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        let alloc = RegionAllocator::<T, R>::new();
        // SAFETY: the value is read out once and `ManuallyDrop` keeps `Drop`
        // from destroying it again
        unsafe {
            let value = this.ptr.as_ptr().read();
            alloc.deallocate(this.ptr, 1);
            value
        }
    }
}

impl<T, R: Region> Drop for RegionBox<T, R> {
    fn drop(&mut self) {
        let alloc = RegionAllocator::<T, R>::new();
        // SAFETY: the slot was allocated and constructed in `new_with`
        unsafe {
            alloc.destroy(self.ptr);
            alloc.deallocate(self.ptr, 1);
        }
    }
}

impl<T, R: Region> Deref for RegionBox<T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T, R: Region> DerefMut for RegionBox<T, R> {
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
    }
}

impl<T: fmt::Debug, R: Region> fmt::Debug for RegionBox<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.get(), f)
    }
}

impl<T: fmt::Display, R: Region> fmt::Display for RegionBox<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.get(), f)
    }
}
