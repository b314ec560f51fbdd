// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded circular FIFO for trigger handles.
//!
//! ## Overview
//!
//! [`RingBuffer`] keeps a fixed backing store of `C` slots and two indices.
//! `read == write` means empty and `(write + 1) % C == read` means full, so at most `C - 1`
//! elements are live at once. There is no separate element counter.
//!
//! Misuse (enqueue when full, dequeue when empty) is a flow-control defect in the caller and
//! panics; there is no recoverable or blocking variant.
//!
//! ```
//! use understory_statechart::queue::RingBuffer;
//!
//! let mut q: RingBuffer<u32> = RingBuffer::new(4);
//! q.enqueue(1);
//! q.enqueue(2);
//! q.enqueue(3);
//! assert!(q.is_full());
//! assert_eq!(q.dequeue(), 1);
//! assert_eq!(q.len(), 2);
//! ```

use alloc::boxed::Box;
use alloc::vec;

use crate::types::TriggerHandle;

/// Backing store size used when a chart does not configure one.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// The per-instance queue of posted triggers.
pub type TriggerQueue = RingBuffer<TriggerHandle>;

/// Fixed-capacity circular FIFO.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    slots: Box<[T]>,
    read: usize,
    write: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create an empty buffer with `capacity` backing slots.
    ///
    /// Panics if `capacity < 2`, since such a buffer could never hold an element.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 2,
            "ring buffer capacity must be at least 2, got {capacity}"
        );
        Self {
            slots: vec![T::default(); capacity].into_boxed_slice(),
            read: 0,
            write: 0,
        }
    }
}

impl<T: Copy + Default> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl<T: Copy> RingBuffer<T> {
    /// Number of backing slots (`C`).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of live elements (`C - 1`).
    pub fn max_len(&self) -> usize {
        self.slots.len() - 1
    }

    /// Whether no element is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Whether another enqueue would violate the capacity bound.
    #[inline]
    pub fn is_full(&self) -> bool {
        (self.write + 1) % self.slots.len() == self.read
    }

    /// Number of queued elements, derived from the indices.
    pub fn len(&self) -> usize {
        let c = self.slots.len();
        (self.write + c - self.read) % c
    }

    /// Append an element at the back.
    ///
    /// Panics if the buffer is full.
    pub fn enqueue(&mut self, element: T) {
        assert!(
            !self.is_full(),
            "enqueue on a full ring buffer (capacity {})",
            self.slots.len()
        );
        self.slots[self.write] = element;
        self.write = (self.write + 1) % self.slots.len();
    }

    /// Remove and return the element at the front.
    ///
    /// Panics if the buffer is empty.
    pub fn dequeue(&mut self) -> T {
        assert!(!self.is_empty(), "dequeue on an empty ring buffer");
        let out = self.slots[self.read];
        self.read = (self.read + 1) % self.slots.len();
        out
    }

    /// Return the element at the front without removing it.
    pub fn peek(&self) -> Option<T> {
        (!self.is_empty()).then(|| self.slots[self.read])
    }

    /// Drop every queued element.
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Iterate queued elements front to back without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let c = self.slots.len();
        (0..self.len()).map(move |i| self.slots[(self.read + i) % c])
    }
}
