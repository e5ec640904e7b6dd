//! Region-backed containers
//!
//! Thin compositions of [`RegionAllocator`] with `allocator_api2`'s
//! allocator-aware vector. Growth goes through the vector's own fallible
//! reservation, so exhaustion surfaces as a [`RegionError`] instead of
//! aborting.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use core::{fmt, mem, str};

use allocator_api2::collections::{TryReserveError, TryReserveErrorKind};

use crate::{DefaultRegion, Region, RegionAllocator, RegionError, Result};

/// Vector whose buffer lives in region `R`
pub type RegionVec<T, R = DefaultRegion> = allocator_api2::vec::Vec<T, RegionAllocator<T, R>>;

/// Translate a failed vector reservation of `additional` elements
fn reserve_error<R: Region>(err: TryReserveError, additional: usize) -> RegionError {
    match err.kind() {
        TryReserveErrorKind::CapacityOverflow => RegionError::Reserve { additional },
        TryReserveErrorKind::AllocError { layout, .. } if layout.align() > R::MAX_ALIGN => {
            RegionError::UnsupportedAlignment {
                align: layout.align(),
                max: R::MAX_ALIGN,
            }
        }
        TryReserveErrorKind::AllocError { layout, .. } => RegionError::OutOfMemory {
            requested: layout.size(),
        },
    }
}

/// Empty vector with room for exactly `capacity` elements
///
/// # Errors
/// Same as [`try_reserve`].
pub fn try_with_capacity<T, R: Region>(capacity: usize) -> Result<RegionVec<T, R>> {
    let mut vec = RegionVec::new_in(RegionAllocator::new());
    vec.try_reserve_exact(capacity)
        .map_err(|err| reserve_error::<R>(err, capacity))?;
    Ok(vec)
}

/// Make room for at least `additional` more elements
///
/// Capacity grows geometrically, and the old block goes back to the region
/// once its elements have moved.
///
/// # Errors
/// - [`RegionError::Reserve`] if the resulting capacity overflows
/// - [`RegionError::OutOfMemory`] if the region is exhausted
///
/// On error `vec` is untouched.
pub fn try_reserve<T, R: Region>(vec: &mut RegionVec<T, R>, additional: usize) -> Result<()> {
    vec.try_reserve(additional)
        .map_err(|err| reserve_error::<R>(err, additional))
}

/// Vector holding a copy of `items` in a single block sized for them
pub fn region_vec<T: Clone, R: Region>(items: &[T]) -> Result<RegionVec<T, R>> {
    let mut vec = try_with_capacity::<T, R>(items.len())?;
    vec.extend_from_slice(items);
    Ok(vec)
}

/// UTF-8 text stored in region `R`
pub struct RegionString<R: Region = DefaultRegion> {
    bytes: RegionVec<u8, R>,
}

impl<R: Region> RegionString<R> {
    /// Empty string; no region storage until the first push
    pub fn new() -> Self {
        Self {
            bytes: RegionVec::new_in(RegionAllocator::new()),
        }
    }

    /// Copy `s` into a block sized for it
    pub fn try_from_str(s: &str) -> Result<Self> {
        Ok(Self {
            bytes: region_vec(s.as_bytes())?,
        })
    }

    /// Append `s`, growing the buffer if needed
    ///
    /// # Errors
    /// Growth failures from [`try_reserve`]; the string is unchanged.
    pub fn push_str(&mut self, s: &str) -> Result<()> {
        try_reserve(&mut self.bytes, s.len())?;
        self.bytes.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Append one character
    pub fn push(&mut self, ch: char) -> Result<()> {
        self.push_str(ch.encode_utf8(&mut [0; 4]))
    }

    /// Borrow the text
    pub fn as_str(&self) -> &str {
        // SAFETY: bytes are only ever appended from `&str`
        unsafe { str::from_utf8_unchecked(&self.bytes) }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes the current block can hold without growing
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Truncate to empty, keeping the buffer
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Deep copy into a fresh block
    pub fn try_clone(&self) -> Result<Self> {
        Self::try_from_str(self.as_str())
    }
}

impl<R: Region> Default for RegionString<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Region> Deref for RegionString<R> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<R: Region> fmt::Display for RegionString<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl<R: Region> fmt::Debug for RegionString<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<R: Region> PartialEq for RegionString<R> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<R: Region> Eq for RegionString<R> {}

impl<R: Region> PartialEq<str> for RegionString<R> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<R: Region> PartialEq<&str> for RegionString<R> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<R: Region> PartialOrd for RegionString<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: Region> Ord for RegionString<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<R: Region> Hash for RegionString<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl<R: Region> Borrow<str> for RegionString<R> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Ordered map whose entries live in region `R`
///
/// Entries are kept sorted by key in a single vector, allocated through the
/// allocator rebound to the `(K, V)` entry type. Iteration is in ascending
/// key order.
pub struct RegionMap<K, V, R: Region = DefaultRegion> {
    entries: RegionVec<(K, V), R>,
}

impl<K: Ord, V, R: Region> RegionMap<K, V, R> {
    /// Empty map; no region storage until the first insert
    pub fn new() -> Self {
        Self {
            entries: RegionVec::new_in(RegionAllocator::new()),
        }
    }

    /// Empty map with room for `capacity` entries
    ///
    /// # Errors
    /// Same as [`try_with_capacity`](fn@try_with_capacity).
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            entries: try_with_capacity(capacity)?,
        })
    }

    fn search<Q>(&self, key: &Q) -> core::result::Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries
            .binary_search_by(|(k, _)| k.borrow().cmp(key))
    }

    /// Insert `value` under `key`, returning the value it replaced
    ///
    /// # Errors
    /// Growth failures; the map is unchanged and `key`/`value` are dropped.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.search(&key) {
            Ok(index) => Ok(Some(mem::replace(&mut self.entries[index].1, value))),
            Err(index) => {
                try_reserve(&mut self.entries, 1)?;
                self.entries.insert(index, (key, value));
                Ok(None)
            }
        }
    }

    /// Value stored under `key`
    ///
    /// `key` may be any borrowed form of `K`, as with the std maps.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).ok().map(|index| &self.entries[index].1)
    }

    /// Mutable access to the value stored under `key`
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Ok(index) => Some(&mut self.entries[index].1),
            Err(_) => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_ok()
    }

    /// Remove the entry for `key`, returning its value
    ///
    /// Capacity is kept for later inserts.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let index = self.search(key).ok()?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry with the smallest key
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(k, v)| (k, v))
    }

    /// Entry with the largest key
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.entries.last().map(|(k, v)| (k, v))
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in ascending order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in ascending key order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Ord, V, R: Region> Default for RegionMap<K, V, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, R: Region> fmt::Debug for RegionMap<K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
