// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Statechart: a deterministic, `no_std` runtime for hierarchical state machines.
//!
//! ## Overview
//!
//! A statechart is a fixed set of named states arranged in a single-parent tree, a closed
//! catalog of trigger kinds, and per-state reactions. This crate runs such charts:
//! - [`StateHierarchy`](crate::hierarchy::StateHierarchy) stores the parent table and answers
//!   ancestor walks, depths, paths and common ancestors.
//! - [`TriggerCatalog`](crate::catalog::TriggerCatalog) holds the trigger kinds and their typed fields.
//! - [`RingBuffer`](crate::queue::RingBuffer) is the bounded FIFO each instance queues triggers in.
//! - [`Machine`](crate::machine::Machine) drains the queue and applies transitions.
//!
//! It does not parse statechart description languages or emit code.
//! Feed the parsed description to a [`StatechartBuilder`](crate::builder::StatechartBuilder),
//! which validates it into an immutable [`Statechart`](crate::chart::Statechart).
//!
//! ## Dispatch
//!
//! Each [`run_step`](crate::machine::Machine::run_step) dequeues one trigger and resolves it
//! against the active state first, then its parent, and so on up to the root.
//! The first state with a reaction for the trigger's kind wins.
//! If the reaction has a target, exit actions run inner→outer for the states being left, then
//! entry actions run outer→inner for the states being entered.
//! Triggers no state reacts to are discarded and reported as
//! [`Step::Unhandled`](crate::types::Step::Unhandled).
//!
//! Reactions run to completion: triggers they post are queued and only dispatched by later steps.
//!
//! ## Example
//!
//! ```
//! use understory_statechart::builder::{Reaction, StatechartBuilder};
//! use understory_statechart::types::Step;
//!
//! // Root
//! // └── A
//! //     └── B
//! let chart = StatechartBuilder::<(), ()>::new("Example")
//!     .trigger("X", "")
//!     .state("Root", None)
//!     .state("A", Some("Root"))
//!     .state("B", Some("A"))
//!     .initial("B")
//!     .on("Root", "X", Reaction::new().target("A"))
//!     .build()
//!     .unwrap();
//!
//! let mut m = chart.instance(());
//! m.post_named("X", ());
//! assert!(matches!(m.run_step(), Step::Handled { .. }));
//! assert_eq!(m.current_state(), chart.state("A").unwrap());
//! ```
//!
//! ## Failure model
//!
//! Building reports malformed descriptions as [`BuildError`](crate::error::BuildError).
//! At run time, contract violations panic: posting an unknown kind, posting into a full
//! queue, or asking for the parent of an undeclared state.
//! Size each chart's queue with [`StatechartConfig`](crate::chart::StatechartConfig).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod builder;
pub mod catalog;
pub mod chart;
pub mod error;
pub mod hierarchy;
pub mod machine;
pub mod pool;
pub mod queue;
pub mod types;
