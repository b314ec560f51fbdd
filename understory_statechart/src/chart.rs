// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable statechart definition consumed by the runtime.
//!
//! ## Overview
//!
//! A [`Statechart`] bundles everything fixed at generation time:
//! - the [`StateHierarchy`] (state → parent table),
//! - the [`TriggerCatalog`] (closed set of kinds with their fields),
//! - a dense handler table indexed by `(state, kind)`,
//! - optional entry and exit actions per state,
//! - the initial state and the [`StatechartConfig`].
//!
//! Build one with [`StatechartBuilder`](crate::builder::StatechartBuilder), then create any
//! number of [`Machine`](crate::machine::Machine) instances from it.
//!
//! ## Resolution
//!
//! [`Statechart::resolve`] walks the ancestor chain of a state, innermost first, and returns
//! the first state with a handler for the kind. The most specific active context gets first
//! refusal.

use alloc::string::String;
use alloc::vec::Vec;

use crate::catalog::TriggerCatalog;
use crate::hierarchy::StateHierarchy;
use crate::machine::{Context, Machine};
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::types::{StateFlags, StateId, Trigger, TriggerKind};

/// Reaction body invoked when a handler matches a trigger.
pub type Action<C, P> = fn(&mut Context<'_, C, P>, &Trigger<P>);

/// Entry or exit action of a state.
pub type StateAction<C, P> = fn(&mut Context<'_, C, P>);

/// Per-chart settings chosen at generation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatechartConfig {
    /// Backing slots of each instance's trigger queue. At most `queue_capacity - 1` triggers
    /// can be pending at once.
    pub queue_capacity: usize,
}

impl Default for StatechartConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// One entry of the handler table: an optional action plus an optional target state.
pub struct Handler<C, P> {
    /// Action run when the handler matches.
    pub action: Option<Action<C, P>>,
    /// State to transition to after the action, if any.
    pub target: Option<StateId>,
}

impl<C, P> Clone for Handler<C, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, P> Copy for Handler<C, P> {}

impl<C, P> core::fmt::Debug for Handler<C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handler")
            .field("has_action", &self.action.is_some())
            .field("target", &self.target)
            .finish()
    }
}

/// Immutable, generated statechart tables.
pub struct Statechart<C, P = ()> {
    pub(crate) name: String,
    pub(crate) hierarchy: StateHierarchy,
    pub(crate) catalog: TriggerCatalog,
    // Row-major: `state * kinds + kind`.
    pub(crate) handlers: Vec<Option<Handler<C, P>>>,
    pub(crate) on_enter: Vec<Option<StateAction<C, P>>>,
    pub(crate) on_exit: Vec<Option<StateAction<C, P>>>,
    pub(crate) flags: Vec<StateFlags>,
    pub(crate) initial: StateId,
    pub(crate) config: StatechartConfig,
}

impl<C, P> core::fmt::Debug for Statechart<C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let handlers = self.handlers.iter().filter(|h| h.is_some()).count();
        f.debug_struct("Statechart")
            .field("name", &self.name)
            .field("states", &self.hierarchy.len())
            .field("triggers", &self.catalog.len())
            .field("handlers", &handlers)
            .field("initial", &self.initial)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C, P> Statechart<C, P> {
    /// Chart name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state tree.
    pub fn hierarchy(&self) -> &StateHierarchy {
        &self.hierarchy
    }

    /// The trigger kinds.
    pub fn catalog(&self) -> &TriggerCatalog {
        &self.catalog
    }

    /// State every new instance starts in.
    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    /// Generation-time settings.
    pub fn config(&self) -> &StatechartConfig {
        &self.config
    }

    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<StateId> {
        self.hierarchy.find(name)
    }

    /// Look up a trigger kind by name.
    pub fn trigger(&self, name: &str) -> Option<TriggerKind> {
        self.catalog.find(name)
    }

    /// Flags of a declared state.
    pub fn flags(&self, state: StateId) -> StateFlags {
        assert!(
            self.hierarchy.contains(state),
            "invalid state {state:?}: not declared in this statechart"
        );
        self.flags[state.index()]
    }

    /// Handler declared directly on `state` for `kind`, ignoring ancestors.
    pub fn handler(&self, state: StateId, kind: TriggerKind) -> Option<&Handler<C, P>> {
        if state.is_none() || !self.catalog.contains(kind) {
            return None;
        }
        let kinds = self.catalog.len();
        self.handlers
            .get(state.index() * kinds + kind.index())
            .and_then(Option::as_ref)
    }

    /// Find the nearest state, starting at `state` itself, that handles `kind`.
    pub fn resolve(&self, state: StateId, kind: TriggerKind) -> Option<(StateId, &Handler<C, P>)> {
        self.hierarchy
            .ancestors(state)
            .find_map(|s| self.handler(s, kind).map(|h| (s, h)))
    }

    /// Entry action of `state`, if declared.
    pub fn on_enter(&self, state: StateId) -> Option<StateAction<C, P>> {
        if !self.flags(state).contains(StateFlags::ON_ENTER) {
            return None;
        }
        self.on_enter[state.index()]
    }

    /// Exit action of `state`, if declared.
    pub fn on_exit(&self, state: StateId) -> Option<StateAction<C, P>> {
        if !self.flags(state).contains(StateFlags::ON_EXIT) {
            return None;
        }
        self.on_exit[state.index()]
    }

    /// Create a running instance with the given extended state.
    pub fn instance(&self, data: C) -> Machine<'_, C, P> {
        Machine::new(self, data)
    }
}
