//! Type-erased callable with region-allocated state
//!
//! States: Empty (no holder) and Holding (exactly one holder). Copies clone
//! the holder into fresh region storage; assignment releases the target's
//! holder before cloning the source's.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use region_alloc::{raw, DefaultRegion, Region, RegionAllocator};
use static_assertions::assert_not_impl_any;

use crate::{Callable, FnError, Result};

/// Dispatch interface of a holder, with the captured type erased
trait Invoke<Args, Ret> {
    fn invoke(&mut self, args: Args) -> Ret;

    /// Copy the captured callable into a new holder in the same region
    fn clone_into_region(&self) -> region_alloc::Result<NonNull<dyn Invoke<Args, Ret>>>;
}

/// Region-resident wrapper around one captured callable
struct Holder<F, R> {
    callable: F,
    _region: PhantomData<fn() -> R>,
}

impl<F, R, Args, Ret> Invoke<Args, Ret> for Holder<F, R>
where
    F: Callable<Args, Output = Ret> + Clone + 'static,
    R: Region,
{
    fn invoke(&mut self, args: Args) -> Ret {
        self.callable.call_with(args)
    }

    fn clone_into_region(&self) -> region_alloc::Result<NonNull<dyn Invoke<Args, Ret>>> {
        let holder: NonNull<dyn Invoke<Args, Ret>> = place::<F, R>(self.callable.clone())?;
        log::debug!(
            "region {}: cloned callable holder ({} bytes)",
            R::NAME,
            mem::size_of::<Self>()
        );
        Ok(holder)
    }
}

/// Allocate a holder for `callable` in region `R`
fn place<F, R>(callable: F) -> region_alloc::Result<NonNull<Holder<F, R>>>
where
    R: Region,
{
    RegionAllocator::<Holder<F, R>, R>::new().emplace(|| Holder {
        callable,
        _region: PhantomData,
    })
}

/// Drop the captured callable, then release the holder's storage
///
/// # Safety
/// `holder` must have been placed in region `R` and not released already.
unsafe fn release<Args, Ret, R: Region>(holder: NonNull<dyn Invoke<Args, Ret>>) {
    let layout = Layout::for_value(unsafe { holder.as_ref() });
    unsafe {
        ptr::drop_in_place(holder.as_ptr());
        raw::deallocate::<R>(holder.cast::<u8>(), layout);
    }
    log::debug!(
        "region {}: released callable holder ({} bytes)",
        R::NAME,
        layout.size()
    );
}

/// Copyable callable taking the argument tuple `Args` and returning `Ret`
///
/// The captured callable is stored by value in region `R`. Copies are
/// independent: each owns its own holder and its own copy of the captured
/// state.
///
/// ```
/// use region_alloc::SystemRegion;
/// use region_fn::RegionFn;
///
/// let mut add = RegionFn::<(i32, i32), i32, SystemRegion>::new(|a: i32, b: i32| a + b)?;
/// assert_eq!(add.call((2, 3))?, 5);
/// # Ok::<(), region_fn::FnError>(())
/// ```
pub struct RegionFn<Args, Ret, R: Region = DefaultRegion> {
    holder: Option<NonNull<dyn Invoke<Args, Ret>>>,
    _region: PhantomData<fn() -> R>,
}

assert_not_impl_any!(RegionFn<(), ()>: Send, Sync);

impl<Args, Ret, R: Region> RegionFn<Args, Ret, R> {
    /// A function with no callable; calling it fails with [`FnError::BadCall`]
    pub const fn empty() -> Self {
        Self {
            holder: None,
            _region: PhantomData,
        }
    }

    /// Capture `callable` by value in region storage
    ///
    /// # Errors
    /// [`FnError::Region`] if the holder cannot be allocated.
    pub fn new<F>(callable: F) -> Result<Self>
    where
        F: Callable<Args, Output = Ret> + Clone + 'static,
    {
        let holder: NonNull<dyn Invoke<Args, Ret>> = place::<F, R>(callable)?;
        log::debug!(
            "region {}: placed callable holder ({} bytes)",
            R::NAME,
            mem::size_of::<Holder<F, R>>()
        );

        Ok(Self {
            holder: Some(holder),
            _region: PhantomData,
        })
    }

    /// Invoke the captured callable
    ///
    /// # Errors
    /// [`FnError::BadCall`] if the function is empty.
    pub fn call(&mut self, args: Args) -> Result<Ret> {
        let mut holder = self.holder.ok_or(FnError::BadCall)?;
        // SAFETY: the holder is live and exclusively owned by `self`
        Ok(unsafe { holder.as_mut() }.invoke(args))
    }

    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }

    pub fn is_set(&self) -> bool {
        self.holder.is_some()
    }

    /// Deep copy: the captured callable is cloned into a new holder
    ///
    /// # Errors
    /// [`FnError::Region`] if the new holder cannot be allocated.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::empty();
        copy.assign(self)?;
        Ok(copy)
    }

    /// Replace this function with a deep copy of `source`
    ///
    /// The current holder is released first, so at no point are two holders
    /// owned. If cloning fails `self` is left empty.
    ///
    /// # Errors
    /// [`FnError::Region`] if the new holder cannot be allocated.
    pub fn assign(&mut self, source: &Self) -> Result<()> {
        self.reset();

        if let Some(holder) = source.holder {
            // SAFETY: `source` keeps its holder alive for this borrow
            let copy = unsafe { holder.as_ref() }.clone_into_region()?;
            self.holder = Some(copy);
        }
        Ok(())
    }

    /// Move the callable out, leaving this function empty
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    fn reset(&mut self) {
        if let Some(holder) = self.holder.take() {
            unsafe { release::<Args, Ret, R>(holder) }
        }
    }
}

impl<Args, Ret, R: Region> Default for RegionFn<Args, Ret, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args, Ret, R: Region> Drop for RegionFn<Args, Ret, R> {
    fn drop(&mut self) {
        self.reset();
    }
}

// Panics on region exhaustion, as std containers do on allocation failure;
// use `try_clone`/`assign` to handle it.
impl<Args, Ret, R: Region> Clone for RegionFn<Args, Ret, R> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("RegionFn clone failed: {err}"),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = self.assign(source) {
            panic!("RegionFn clone failed: {err}");
        }
    }
}

impl<Args, Ret, R: Region> fmt::Debug for RegionFn<Args, Ret, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionFn")
            .field("region", &R::NAME)
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use region_alloc::mock::{self, MockRegion};
    use region_alloc::RegionError;
    use std::rc::Rc;

    /// Records its drop and the number of live region blocks at that moment
    #[derive(Clone)]
    struct DropTracker {
        drops: Rc<Cell<usize>>,
        live_at_drop: Rc<Cell<Option<usize>>>,
    }

    impl DropTracker {
        fn new() -> Self {
            Self {
                drops: Rc::new(Cell::new(0)),
                live_at_drop: Rc::new(Cell::new(None)),
            }
        }
    }

    impl Drop for DropTracker {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
            self.live_at_drop.set(Some(mock::stats().live_blocks));
        }
    }

    fn counter() -> RegionFn<(), u32, MockRegion> {
        let mut count = 0;
        RegionFn::new(move || {
            count += 1;
            count
        })
        .unwrap()
    }

    #[test]
    fn test_empty_call_fails() {
        let mut f = RegionFn::<(), u32, MockRegion>::default();
        assert!(f.is_empty());
        assert!(!f.is_set());
        assert_eq!(f.call(()), Err(FnError::BadCall));
    }

    #[test]
    fn test_call_with_arguments() {
        mock::reset();
        let mut add = RegionFn::<(i32, i32), i32, MockRegion>::new(|a: i32, b: i32| a + b).unwrap();
        assert!(add.is_set());
        assert_eq!(add.call((2, 3)), Ok(5));
        assert_eq!(add.call((-2, 2)), Ok(0));
    }

    #[test]
    fn test_function_item() {
        fn double(x: u64) -> u64 {
            x * 2
        }

        let mut f = RegionFn::<(u64,), u64, MockRegion>::new(double).unwrap();
        assert_eq!(f.call((21,)), Ok(42));
    }

    #[test]
    fn test_holder_lives_in_region() {
        mock::reset();
        let offset = 100u64;
        let f = RegionFn::<(u64,), u64, MockRegion>::new(move |x: u64| x + offset).unwrap();

        let stats = mock::stats();
        assert_eq!(stats.live_blocks, 1);
        assert_eq!(stats.live_bytes, mem::size_of::<u64>());

        drop(f);
        assert_eq!(mock::stats().live_blocks, 0);
    }

    #[test]
    fn test_copies_are_independent() {
        mock::reset();
        let mut a = counter();
        assert_eq!(a.call(()), Ok(1));

        let mut b = a.try_clone().unwrap();
        assert_eq!(mock::stats().live_blocks, 2);

        assert_eq!(a.call(()), Ok(2));
        assert_eq!(b.call(()), Ok(2));
        assert_eq!(b.call(()), Ok(3));
        assert_eq!(a.call(()), Ok(3));
    }

    #[test]
    fn test_clone_of_empty_is_empty() {
        mock::reset();
        let empty = RegionFn::<(), u32, MockRegion>::empty();
        let copy = empty.clone();
        assert!(copy.is_empty());
        assert_eq!(mock::stats().allocs, 0);
    }

    #[test]
    fn test_assign_releases_previous_holder_first() {
        mock::reset();
        let old = DropTracker::new();
        let new = DropTracker::new();

        let mut target = {
            let tracker = old.clone();
            RegionFn::<(), usize, MockRegion>::new(move || tracker.drops.get()).unwrap()
        };
        let source = {
            let tracker = new.clone();
            RegionFn::<(), usize, MockRegion>::new(move || tracker.drops.get()).unwrap()
        };
        assert_eq!(mock::stats().live_blocks, 2);

        target.assign(&source).unwrap();

        // Dropped exactly once, while only the two original holders existed
        assert_eq!(old.drops.get(), 1);
        assert_eq!(old.live_at_drop.get(), Some(2));
        assert_eq!(new.drops.get(), 0);
        assert_eq!(mock::stats().live_blocks, 2);

        drop(target);
        assert_eq!(old.drops.get(), 1);
        assert_eq!(new.drops.get(), 1);
        drop(source);
        assert_eq!(new.drops.get(), 2);
        assert_eq!(mock::stats().live_blocks, 0);
    }

    #[test]
    fn test_assign_from_empty() {
        mock::reset();
        let mut target = counter();
        target.assign(&RegionFn::empty()).unwrap();

        assert!(target.is_empty());
        assert_eq!(target.call(()), Err(FnError::BadCall));
        assert_eq!(mock::stats().live_blocks, 0);
    }

    #[test]
    fn test_failed_assign_leaves_target_empty() {
        mock::reset();
        let mut target = counter();
        let source = counter();
        mock::set_budget(Some(0));

        let err = target.assign(&source).unwrap_err();
        assert!(matches!(
            err,
            FnError::Region(RegionError::OutOfMemory { .. })
        ));
        assert!(target.is_empty());
        assert_eq!(mock::stats().live_blocks, 1);
    }

    #[test]
    fn test_new_reports_exhaustion() {
        mock::reset();
        mock::set_budget(Some(0));
        let captured = [0u8; 32];

        let err = RegionFn::<(), u8, MockRegion>::new(move || captured[0]).unwrap_err();
        assert_eq!(
            err,
            FnError::Region(RegionError::OutOfMemory { requested: 32 })
        );
    }

    #[test]
    fn test_clone_from_reuses_assign() {
        mock::reset();
        let source = counter();
        let mut target = counter();
        let mut target_copy = target.clone();
        assert_eq!(target_copy.call(()), Ok(1));

        target.clone_from(&source);
        assert_eq!(target.call(()), Ok(1));
        assert_eq!(mock::stats().live_blocks, 3);
    }

    #[test]
    #[should_panic(expected = "RegionFn clone failed")]
    fn test_clone_panics_on_exhaustion() {
        mock::reset();
        let f = counter();
        mock::set_budget(Some(0));
        let _ = f.clone();
    }

    #[test]
    fn test_take_moves_holder() {
        mock::reset();
        let mut a = counter();
        let mut b = a.take();

        assert!(a.is_empty());
        assert_eq!(b.call(()), Ok(1));
        assert_eq!(mock::stats().live_blocks, 1);
    }

    #[test]
    fn test_stateless_closure_skips_region() {
        mock::reset();
        let mut f = RegionFn::<(u8,), u8, MockRegion>::new(|x: u8| x.wrapping_add(1)).unwrap();
        let mut g = f.try_clone().unwrap();

        assert_eq!(f.call((1,)), Ok(2));
        assert_eq!(g.call((255,)), Ok(0));
        assert_eq!(mock::stats().allocs, 0);
    }

    #[test]
    fn test_debug_reports_state() {
        let f = counter();
        let rendered = std::format!("{f:?}");
        assert!(rendered.contains("mock"));
        assert!(rendered.contains("set: true"));
    }
}
