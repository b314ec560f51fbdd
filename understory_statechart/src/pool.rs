// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Out-of-band payload storage keyed by [`TriggerHandle`].
//!
//! Payloads vary in size, so the queue only carries a 32-bit handle. The pool is a slot
//! arena with a free list; a slot is occupied from [`TriggerPool::insert`] until
//! [`TriggerPool::take`] hands the trigger to the dispatcher.

use alloc::vec::Vec;

use crate::types::{Trigger, TriggerHandle};

/// Slot arena holding the payloads of queued triggers.
#[derive(Clone, Debug)]
pub struct TriggerPool<P> {
    slots: Vec<Option<Trigger<P>>>,
    free_list: Vec<usize>,
}

impl<P> Default for TriggerPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> TriggerPool<P> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Create an empty pool with room for `n` payloads before reallocating.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n),
            free_list: Vec::with_capacity(n),
        }
    }

    /// Store a trigger and return the handle addressing it.
    pub fn insert(&mut self, trigger: Trigger<P>) -> TriggerHandle {
        let slot = if let Some(slot) = self.free_list.pop() {
            self.slots[slot] = Some(trigger);
            slot
        } else {
            self.slots.push(Some(trigger));
            self.slots.len() - 1
        };
        TriggerHandle::new(slot)
    }

    /// Remove and return the trigger addressed by `handle`.
    ///
    /// Panics if the slot is vacant, which means the handle was already consumed.
    pub fn take(&mut self, handle: TriggerHandle) -> Trigger<P> {
        let trigger = self
            .slots
            .get_mut(handle.slot())
            .and_then(Option::take);
        let Some(trigger) = trigger else {
            panic!("stale trigger handle {handle:?}");
        };
        self.free_list.push(handle.slot());
        trigger
    }

    /// Borrow the trigger addressed by `handle`, if occupied.
    pub fn get(&self, handle: TriggerHandle) -> Option<&Trigger<P>> {
        self.slots.get(handle.slot()).and_then(Option::as_ref)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored payload.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}
