// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the runtime: state and trigger identifiers, queue handles, and dispatch results.
//!
//! ## Overview
//!
//! Identifiers are small, copyable indices handed out by the
//! [`StatechartBuilder`](crate::builder::StatechartBuilder). They are only meaningful for the
//! [`Statechart`](crate::chart::Statechart) that produced them.

/// Identifier for a declared state.
///
/// A dense index into the state tables of one statechart.
/// [`StateId::NONE`] is the root sentinel: it is the parent of every root state and terminates
/// every ancestor walk.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    /// The root sentinel ("no parent").
    pub const NONE: Self = Self(u32::MAX);

    #[allow(
        clippy::cast_possible_truncation,
        reason = "State tables are indexed with 32-bit ids; the builder rejects larger charts."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    /// Index of this state in the chart's tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the root sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// Identifier for a declared trigger kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TriggerKind(pub(crate) u32);

impl TriggerKind {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Trigger kinds are 32-bit; the builder rejects larger catalogs."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    /// Index of this kind in the catalog.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed-width queue element standing in for a posted trigger.
///
/// The payload lives out of band in a [`TriggerPool`](crate::pool::TriggerPool);
/// the handle is the pool slot that holds it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TriggerHandle(pub(crate) u32);

impl TriggerHandle {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Handles are intentionally 32-bit; pools never grow past the queue capacity."
    )]
    pub(crate) const fn new(slot: usize) -> Self {
        Self(slot as u32)
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

/// A posted trigger: its kind plus the application payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger<P = ()> {
    /// Declared kind of this trigger.
    pub kind: TriggerKind,
    /// Application payload carrying the kind's fields.
    pub payload: P,
}

bitflags::bitflags! {
    /// Per-state flags computed by the builder.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// State is the chart's initial state.
        const INITIAL   = 0b0000_0001;
        /// State has at least one child.
        const COMPOSITE = 0b0000_0010;
        /// State declares an entry action.
        const ON_ENTER  = 0b0000_0100;
        /// State declares an exit action.
        const ON_EXIT   = 0b0000_1000;
    }
}

/// A state change applied by a dispatch step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    /// Active state before the step.
    pub from: StateId,
    /// Active state after the step.
    pub to: StateId,
}

/// Result of a single [`Machine::run_step`](crate::machine::Machine::run_step).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// The queue was empty; nothing ran.
    Idle,
    /// A reaction on `by` (the active state or one of its ancestors) handled the trigger.
    Handled {
        /// Kind of the dispatched trigger.
        kind: TriggerKind,
        /// State whose reaction ran.
        by: StateId,
        /// Transition taken, if the reaction had a target.
        transition: Option<Transition>,
    },
    /// No state on the ancestor chain reacts to this kind; the trigger was discarded.
    Unhandled {
        /// Kind of the discarded trigger.
        kind: TriggerKind,
    },
}
