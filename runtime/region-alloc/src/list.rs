//! Doubly linked list with region-resident nodes
//!
//! The list is typed by its element, but what it allocates are nodes. Its
//! node allocator is the element allocator rebound through [`Rebind`], so
//! every node comes from the same region as the list's elements would.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::{DefaultRegion, Rebind, Region, RegionAllocator, Result};

type Link<T> = Option<NonNull<Node<T>>>;

struct Node<T> {
    value: T,
    prev: Link<T>,
    next: Link<T>,
}

/// Doubly linked list whose nodes live in region `R`
///
/// Each element gets its own node block. Pushes are fallible and leave the
/// list unchanged on exhaustion.
pub struct RegionList<T, R: Region = DefaultRegion> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    nodes: RegionAllocator<Node<T>, R>,
    _owns: PhantomData<T>,
}

// SAFETY: the list owns its nodes exclusively, like `Box<Node<T>>` chains
unsafe impl<T: Send, R: Region> Send for RegionList<T, R> {}
// SAFETY: shared access only hands out `&T`
unsafe impl<T: Sync, R: Region> Sync for RegionList<T, R> {}

impl<T, R: Region> RegionList<T, R> {
    /// Empty list; no region storage until the first push
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            nodes: Rebind::rebind::<Node<T>>(&RegionAllocator::<T, R>::new()),
            _owns: PhantomData,
        }
    }

    /// The element allocator this list was built from
    pub fn allocator(&self) -> RegionAllocator<T, R> {
        Rebind::rebind::<T>(&self.nodes)
    }

    /// Append `value` at the back
    ///
    /// # Errors
    /// Node allocation failures; `value` is dropped and the list is unchanged.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        let prev = self.tail;
        let node = self.nodes.emplace(|| Node {
            value,
            prev,
            next: None,
        })?;

        match prev {
            // SAFETY: `tail` is a live node owned by this list
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Prepend `value` at the front
    ///
    /// # Errors
    /// Same as [`RegionList::push_back`].
    pub fn push_front(&mut self, value: T) -> Result<()> {
        let next = self.head;
        let node = self.nodes.emplace(|| Node {
            value,
            prev: None,
            next,
        })?;

        match next {
            // SAFETY: `head` is a live node owned by this list
            Some(mut head) => unsafe { head.as_mut().prev = Some(node) },
            None => self.tail = Some(node),
        }
        self.head = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Remove the first element and release its node
    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.head?;
        // SAFETY: `node` is live and owned by this list; it is read out once
        // and its block released without dropping the moved value
        let Node { value, next, .. } = unsafe { self.release(node) };

        self.head = next;
        match next {
            // SAFETY: the successor stays owned by this list
            Some(mut next) => unsafe { next.as_mut().prev = None },
            None => self.tail = None,
        }
        self.len -= 1;
        Some(value)
    }

    /// Remove the last element and release its node
    pub fn pop_back(&mut self) -> Option<T> {
        let node = self.tail?;
        // SAFETY: as in `pop_front`
        let Node { value, prev, .. } = unsafe { self.release(node) };

        self.tail = prev;
        match prev {
            // SAFETY: the predecessor stays owned by this list
            Some(mut prev) => unsafe { prev.as_mut().next = None },
            None => self.head = None,
        }
        self.len -= 1;
        Some(value)
    }

    /// Move the node's contents out and give its block back to the region
    ///
    /// # Safety
    /// `node` must be a live node of this list that is unlinked by the caller
    /// and never touched again.
    unsafe fn release(&self, node: NonNull<Node<T>>) -> Node<T> {
        unsafe {
            let contents = node.as_ptr().read();
            self.nodes.deallocate(node, 1);
            contents
        }
    }

    pub fn front(&self) -> Option<&T> {
        // SAFETY: nodes live as long as the list, and `&self` forbids unlinking
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    pub fn back(&self) -> Option<&T> {
        // SAFETY: as in `front`
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every element and release every node
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Elements from front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: self.head,
            tail: self.tail,
            len: self.len,
            _list: PhantomData,
        }
    }
}

impl<T, R: Region> Drop for RegionList<T, R> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, R: Region> Default for RegionList<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, R: Region> fmt::Debug for RegionList<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, R: Region> IntoIterator for &'a RegionList<T, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Borrowing iterator over a [`RegionList`]
pub struct Iter<'a, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _list: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        self.head.map(|node| {
            // SAFETY: the list is borrowed for 'a, so its nodes stay live
            let node = unsafe { &*node.as_ptr() };
            self.len -= 1;
            self.head = node.next;
            &node.value
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        self.tail.map(|node| {
            // SAFETY: as in `next`
            let node = unsafe { &*node.as_ptr() };
            self.len -= 1;
            self.tail = node.prev;
            &node.value
        })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockRegion};
    use crate::{RegionError, RegionString};
    use core::cell::Cell;
    use core::mem;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use std::rc::Rc;

    type MockString = RegionString<MockRegion>;

    assert_impl_all!(RegionList<u32, crate::SystemRegion>: Send, Sync);
    assert_not_impl_any!(RegionList<Rc<u32>, crate::SystemRegion>: Send, Sync);

    fn text(s: &str) -> MockString {
        MockString::try_from_str(s).unwrap()
    }

    #[test]
    fn test_list_of_region_strings() {
        mock::reset();
        let mut list = RegionList::<MockString, MockRegion>::new();
        list.push_back(text("from")).unwrap();
        list.push_back(text("PSRAM")).unwrap();
        list.push_front(text("Hello")).unwrap();

        assert_eq!(list.len(), 3);
        let words: std::vec::Vec<&str> = list.iter().map(|s| s.as_str()).collect();
        assert_eq!(words, ["Hello", "from", "PSRAM"]);
        let reversed: std::vec::Vec<&str> = list.iter().rev().map(|s| s.as_str()).collect();
        assert_eq!(reversed, ["PSRAM", "from", "Hello"]);

        // One block per node plus one per string
        assert_eq!(mock::stats().live_blocks, 6);

        drop(list);
        assert_eq!(mock::stats().live_blocks, 0);
    }

    #[test]
    fn test_nodes_use_rebound_allocator() {
        mock::reset();
        let mut list = RegionList::<u64, MockRegion>::new();
        assert_eq!(list.allocator(), RegionAllocator::<u64, MockRegion>::new());
        assert_eq!(mock::stats().allocs, 0);

        list.push_back(7).unwrap();
        assert_eq!(
            mock::stats().last_request,
            Some(mem::size_of::<Node<u64>>())
        );
        assert_eq!(mock::stats().live_bytes, mem::size_of::<Node<u64>>());
    }

    #[test]
    fn test_pop_both_ends() {
        mock::reset();
        let mut list = RegionList::<i32, MockRegion>::new();
        for value in 1..=4 {
            list.push_back(value).unwrap();
        }

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(4));
        assert_eq!(list.front(), Some(&2));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(mock::stats().live_blocks, 2);

        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(mock::stats().live_blocks, 0);

        list.push_front(9).unwrap();
        assert_eq!(std::format!("{list:?}"), "[9]");
    }

    #[test]
    fn test_push_exhaustion_leaves_list_intact() {
        struct Tracked(Rc<Cell<usize>>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        mock::reset();
        let drops = Rc::new(Cell::new(0));
        let mut list = RegionList::<Tracked, MockRegion>::new();
        list.push_back(Tracked(drops.clone())).unwrap();

        let node_size = mem::size_of::<Node<Tracked>>();
        mock::set_budget(Some(node_size));
        assert_eq!(
            list.push_front(Tracked(drops.clone())),
            Err(RegionError::OutOfMemory {
                requested: node_size
            })
        );
        assert_eq!(drops.get(), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.iter().count(), 1);

        drop(list);
        assert_eq!(drops.get(), 2);
        assert_eq!(mock::stats().live_blocks, 0);
    }

    #[test]
    fn test_iter_meets_in_the_middle() {
        let mut list = RegionList::<u8, MockRegion>::new();
        for value in [1, 2, 3] {
            list.push_back(value).unwrap();
        }

        let mut iter = list.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
    }
}
