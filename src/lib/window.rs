//! Ring buffer addressed by monotonically increasing logical indices.
//!
//! This module provides the sliding window the coverage engine keeps its
//! in-flight records in. Entries are appended at the right edge and evicted
//! from the left edge; any live entry can be read or rewritten by index.
//!
//! # Indexing
//!
//! Every pushed value receives the next logical index (`0, 1, 2, ...`), which
//! is never reused. The value lives in physical slot `index & (capacity - 1)`.
//! When the buffer is full it doubles its capacity and re-seats the live
//! entries so that the mapping still holds; indices held by callers stay
//! valid across growth.
//!
//! # Example
//!
//! ```
//! use covcap_lib::window::WindowBuffer;
//!
//! let mut window: WindowBuffer<&str> = WindowBuffer::with_capacity(2);
//!
//! let a = window.push("a");
//! let b = window.push("b");
//! let c = window.push("c"); // grows to capacity 4
//!
//! assert_eq!((a, b, c), (0, 1, 2));
//! assert_eq!(window.pop_front(), Some("a"));
//! assert_eq!(window.leftmost(), Some(1));
//! assert_eq!(*window.get(c), "c");
//! ```

use std::ops::Range;

/// Initial slot count when none is requested.
pub const DEFAULT_WINDOW_CAPACITY: usize = 64;

/// A growable ring buffer with stable logical indices.
#[derive(Debug)]
pub struct WindowBuffer<T> {
    /// Physical slots; length is always a power of two.
    slots: Vec<Option<T>>,
    /// Logical index of the leftmost live entry.
    head: u64,
    /// Number of live entries.
    len: usize,
    /// Largest `len` ever observed.
    peak_len: usize,
}

impl<T> Default for WindowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WindowBuffer<T> {
    /// Create an empty buffer with [`DEFAULT_WINDOW_CAPACITY`] slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }

    /// Create an empty buffer with at least `capacity` slots (rounded up to a
    /// power of two, minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self { slots: empty_slots(capacity), head: 0, len: 0, peak_len: 0 }
    }

    #[inline]
    fn slot(&self, index: u64) -> usize {
        (index & (self.slots.len() as u64 - 1)) as usize
    }

    /// Append `value` at the right edge and return its logical index.
    pub fn push(&mut self, value: T) -> u64 {
        if self.len == self.slots.len() {
            self.grow();
        }
        let index = self.end_index();
        let slot = self.slot(index);
        debug_assert!(self.slots[slot].is_none(), "slot {slot} for index {index} is occupied");
        self.slots[slot] = Some(value);
        self.len += 1;
        self.peak_len = self.peak_len.max(self.len);
        index
    }

    /// Double the slot count, re-seating live entries under the new mask.
    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        let new_mask = new_capacity as u64 - 1;
        let mut slots = empty_slots(new_capacity);
        for index in self.head..self.end_index() {
            let old = self.slot(index);
            slots[(index & new_mask) as usize] = self.slots[old].take();
        }
        self.slots = slots;
    }

    /// True if `index` refers to a live entry.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: u64) -> bool {
        index >= self.head && index < self.end_index()
    }

    /// The entry at `index`, or `None` if it is not live.
    #[must_use]
    pub fn try_get(&self, index: u64) -> Option<&T> {
        if self.contains(index) { self.slots[self.slot(index)].as_ref() } else { None }
    }

    /// Mutable access to the entry at `index`, or `None` if it is not live.
    pub fn try_get_mut(&mut self, index: u64) -> Option<&mut T> {
        if self.contains(index) {
            let slot = self.slot(index);
            self.slots[slot].as_mut()
        } else {
            None
        }
    }

    /// The entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the live range.
    #[must_use]
    pub fn get(&self, index: u64) -> &T {
        match self.try_get(index) {
            Some(value) => value,
            None => panic!("window index {index} outside live range {:?}", self.live_range()),
        }
    }

    /// Mutable access to the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the live range.
    pub fn get_mut(&mut self, index: u64) -> &mut T {
        let live = self.live_range();
        match self.try_get_mut(index) {
            Some(value) => value,
            None => panic!("window index {index} outside live range {live:?}"),
        }
    }

    /// Replace the entry at `index`, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the live range.
    pub fn set(&mut self, index: u64, value: T) -> T {
        std::mem::replace(self.get_mut(index), value)
    }

    /// Evict and return the leftmost entry.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.slot(self.head);
        let value = self.slots[slot].take();
        debug_assert!(value.is_some(), "live slot {slot} was empty");
        self.head += 1;
        self.len -= 1;
        value
    }

    /// Logical index of the leftmost live entry.
    #[must_use]
    pub fn leftmost(&self) -> Option<u64> {
        (self.len > 0).then_some(self.head)
    }

    /// Logical index of the rightmost live entry.
    #[must_use]
    pub fn rightmost(&self) -> Option<u64> {
        (self.len > 0).then(|| self.end_index() - 1)
    }

    /// The index the next `push` will assign.
    #[inline]
    #[must_use]
    pub fn end_index(&self) -> u64 {
        self.head + self.len as u64
    }

    /// Range of live logical indices.
    #[must_use]
    pub fn live_range(&self) -> Range<u64> {
        self.head..self.end_index()
    }

    /// Iterate over live entries whose index falls in `range`.
    pub fn iter_range(&self, range: Range<u64>) -> impl Iterator<Item = &T> + '_ {
        let start = range.start.max(self.head);
        let end = range.end.min(self.end_index());
        (start..end).filter_map(move |index| self.slots[self.slot(index)].as_ref())
    }

    /// Iterate over all live entries from left to right.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter_range(self.live_range())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of physical slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Largest number of simultaneously live entries seen so far.
    #[must_use]
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }
}

fn empty_slots<T>(capacity: usize) -> Vec<Option<T>> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}
