// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-time builder: validates a parsed statechart description into runtime tables.
//!
//! ## Overview
//!
//! Feed the builder names only: trigger kinds with field lists, states with optional parent
//! names, reactions keyed by `(state, trigger)`, entry/exit actions, and the initial state.
//! Declarations may appear in any order. [`StatechartBuilder::build`] resolves every name and
//! reports the first problem as a [`BuildError`].
//!
//! ```
//! use understory_statechart::builder::{Reaction, StatechartBuilder};
//! use understory_statechart::machine::Context;
//! use understory_statechart::types::Trigger;
//!
//! fn tick(cx: &mut Context<'_, u32, ()>, _: &Trigger) {
//!     *cx.data_mut() += 1;
//! }
//!
//! let chart = StatechartBuilder::<u32>::new("Counter")
//!     .trigger("Tick", "")
//!     .trigger("Reset", "")
//!     .state("Root", None)
//!     .state("Counting", Some("Root"))
//!     .initial("Counting")
//!     .on("Counting", "Tick", Reaction::new().action(tick))
//!     .on("Root", "Reset", Reaction::new().target("Counting"))
//!     .build()
//!     .unwrap();
//!
//! let mut m = chart.instance(0);
//! m.post_named("Tick", ());
//! m.post_named("Tick", ());
//! assert_eq!(m.run_to_quiescence(), 2);
//! assert_eq!(*m.data(), 2);
//! ```

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::catalog::TriggerCatalog;
use crate::chart::{Action, Handler, StateAction, Statechart, StatechartConfig};
use crate::error::BuildError;
use crate::hierarchy::StateHierarchy;
use crate::types::{StateFlags, StateId};

/// A reaction declared on a state: an optional action and an optional target state name.
pub struct Reaction<C, P = ()> {
    action: Option<Action<C, P>>,
    target: Option<String>,
}

impl<C, P> Default for Reaction<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P> core::fmt::Debug for Reaction<C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reaction")
            .field("has_action", &self.action.is_some())
            .field("target", &self.target)
            .finish()
    }
}

impl<C, P> Reaction<C, P> {
    /// A reaction that does nothing (it still consumes the trigger).
    pub fn new() -> Self {
        Self {
            action: None,
            target: None,
        }
    }

    /// Run `action` when the reaction fires.
    pub fn action(mut self, action: Action<C, P>) -> Self {
        self.action = Some(action);
        self
    }

    /// Transition to `state` after the action.
    pub fn target(mut self, state: &str) -> Self {
        self.target = Some(state.to_string());
        self
    }
}

/// Collects a statechart description and validates it into a [`Statechart`].
pub struct StatechartBuilder<C, P = ()> {
    name: String,
    triggers: Vec<(String, String)>,
    states: Vec<(String, Option<String>)>,
    initial: Option<String>,
    reactions: Vec<(String, String, Reaction<C, P>)>,
    enters: Vec<(String, StateAction<C, P>)>,
    exits: Vec<(String, StateAction<C, P>)>,
    config: StatechartConfig,
}

impl<C, P> core::fmt::Debug for StatechartBuilder<C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StatechartBuilder")
            .field("name", &self.name)
            .field("triggers", &self.triggers.len())
            .field("states", &self.states.len())
            .field("reactions", &self.reactions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C, P> StatechartBuilder<C, P> {
    /// Start describing a chart called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            triggers: Vec::new(),
            states: Vec::new(),
            initial: None,
            reactions: Vec::new(),
            enters: Vec::new(),
            exits: Vec::new(),
            config: StatechartConfig::default(),
        }
    }

    /// Declare a trigger kind with a field list such as `"x: i32, y: i32"` (may be empty).
    pub fn trigger(mut self, name: &str, fields: &str) -> Self {
        self.triggers.push((name.to_string(), fields.to_string()));
        self
    }

    /// Declare a state; `parent: None` makes it a root.
    pub fn state(mut self, name: &str, parent: Option<&str>) -> Self {
        self.states
            .push((name.to_string(), parent.map(ToString::to_string)));
        self
    }

    /// Choose the state new instances start in.
    pub fn initial(mut self, state: &str) -> Self {
        self.initial = Some(state.to_string());
        self
    }

    /// Declare how `state` reacts to `trigger`.
    pub fn on(mut self, state: &str, trigger: &str, reaction: Reaction<C, P>) -> Self {
        self.reactions
            .push((state.to_string(), trigger.to_string(), reaction));
        self
    }

    /// Run `action` whenever `state` is entered.
    pub fn on_enter(mut self, state: &str, action: StateAction<C, P>) -> Self {
        self.enters.push((state.to_string(), action));
        self
    }

    /// Run `action` whenever `state` is exited.
    pub fn on_exit(mut self, state: &str, action: StateAction<C, P>) -> Self {
        self.exits.push((state.to_string(), action));
        self
    }

    /// Set the number of backing slots in each instance's trigger queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StatechartConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve and validate the description.
    pub fn build(self) -> Result<Statechart<C, P>, BuildError> {
        if self.config.queue_capacity < 2 {
            return Err(BuildError::QueueCapacity(self.config.queue_capacity));
        }

        let mut catalog = TriggerCatalog::new();
        for (name, fields) in &self.triggers {
            catalog.declare(name, fields)?;
        }

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }
        let entries: Vec<(&str, Option<&str>)> = self
            .states
            .iter()
            .map(|(name, parent)| (name.as_str(), parent.as_deref()))
            .collect();
        let hierarchy = StateHierarchy::from_parents(&entries)?;
        let find_state = |name: &str| {
            hierarchy
                .find(name)
                .ok_or_else(|| BuildError::UnknownState(name.to_string()))
        };

        let initial = find_state(self.initial.as_deref().ok_or(BuildError::MissingInitial)?)?;

        let kinds = catalog.len();
        let mut handlers: Vec<Option<Handler<C, P>>> = Vec::new();
        handlers.resize_with(hierarchy.len() * kinds, || None);
        for (state_name, trigger_name, reaction) in &self.reactions {
            let state = find_state(state_name)?;
            let kind = catalog
                .find(trigger_name)
                .ok_or_else(|| BuildError::UnknownTrigger(trigger_name.clone()))?;
            let target = reaction.target.as_deref().map(find_state).transpose()?;
            let slot = &mut handlers[state.index() * kinds + kind.index()];
            if slot.is_some() {
                return Err(BuildError::DuplicateReaction {
                    state: state_name.clone(),
                    trigger: trigger_name.clone(),
                });
            }
            *slot = Some(Handler {
                action: reaction.action,
                target,
            });
        }

        let mut flags = vec![StateFlags::empty(); hierarchy.len()];
        flags[initial.index()] |= StateFlags::INITIAL;
        for state in hierarchy.states() {
            let parent = hierarchy.parent_state(state);
            if !parent.is_none() {
                flags[parent.index()] |= StateFlags::COMPOSITE;
            }
        }

        let on_enter = collect_actions(&hierarchy, &self.enters, &mut flags, StateFlags::ON_ENTER)?;
        let on_exit = collect_actions(&hierarchy, &self.exits, &mut flags, StateFlags::ON_EXIT)?;

        tracing::debug!(
            chart = self.name.as_str(),
            states = hierarchy.len(),
            triggers = kinds,
            reactions = self.reactions.len(),
            queue_capacity = self.config.queue_capacity,
            "statechart built"
        );

        Ok(Statechart {
            name: self.name,
            hierarchy,
            catalog,
            handlers,
            on_enter,
            on_exit,
            flags,
            initial,
            config: self.config,
        })
    }
}

fn collect_actions<C, P>(
    hierarchy: &StateHierarchy,
    declared: &[(String, StateAction<C, P>)],
    flags: &mut [StateFlags],
    flag: StateFlags,
) -> Result<Vec<Option<StateAction<C, P>>>, BuildError> {
    let mut out = vec![None; hierarchy.len()];
    for (name, action) in declared {
        let state: StateId = hierarchy
            .find(name)
            .ok_or_else(|| BuildError::UnknownState(name.clone()))?;
        if flags[state.index()].contains(flag) {
            return Err(BuildError::DuplicateAction(name.clone()));
        }
        flags[state.index()] |= flag;
        out[state.index()] = Some(*action);
    }
    Ok(out)
}
