// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Statechart instances: trigger posting and the dispatch loop.
//!
//! ## Overview
//!
//! A [`Machine`] owns the active state, a bounded [`TriggerQueue`], the payload pool, and the
//! application's extended state `C`. It borrows its immutable [`Statechart`].
//!
//! ## Dispatch
//!
//! [`Machine::run_step`] dequeues one trigger and walks the ancestor chain of the active state,
//! innermost first. The first state with a handler for the trigger's kind wins:
//! 1) its action runs;
//! 2) if the handler has a target, exit actions run inner→outer for every state left, then
//!    entry actions run outer→inner for every state entered;
//! 3) the active state becomes the target.
//!
//! A trigger nobody handles is discarded. That is ordinary statechart behavior, not an error.
//!
//! ## Run-to-completion
//!
//! Actions may post further triggers through their [`Context`]. Those are only queued; they are
//! dispatched by later steps, in posting order, once the current step has fully finished.
//!
//! ## Threads
//!
//! Nothing here locks. To post from several threads, put the machine behind one external lock.

use crate::catalog::TriggerCatalog;
use crate::chart::Statechart;
use crate::hierarchy::StateHierarchy;
use crate::pool::TriggerPool;
use crate::queue::TriggerQueue;
use crate::types::{StateId, Step, Transition, Trigger, TriggerKind};

/// A running statechart instance.
pub struct Machine<'a, C, P = ()> {
    chart: &'a Statechart<C, P>,
    current: StateId,
    started: bool,
    queue: TriggerQueue,
    pool: TriggerPool<P>,
    data: C,
}

impl<C, P> core::fmt::Debug for Machine<'_, C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Machine")
            .field("chart", &self.chart.name())
            .field("current", &self.chart.hierarchy().name(self.current))
            .field("started", &self.started)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<'a, C, P> Machine<'a, C, P> {
    /// Create an instance in the chart's initial state with an empty queue.
    ///
    /// Entry actions do not run until [`Machine::start`] is called.
    pub fn new(chart: &'a Statechart<C, P>, data: C) -> Self {
        let capacity = chart.config().queue_capacity;
        Self {
            chart,
            current: chart.initial_state(),
            started: false,
            queue: TriggerQueue::new(capacity),
            pool: TriggerPool::with_capacity(capacity - 1),
            data,
        }
    }

    /// The definition this instance runs.
    pub fn chart(&self) -> &'a Statechart<C, P> {
        self.chart
    }

    /// The active state.
    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Whether the active state is `state` or a descendant of it.
    pub fn is_in(&self, state: StateId) -> bool {
        self.chart.hierarchy().is_ancestor_of(state, self.current)
    }

    /// Number of queued triggers.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The extended state.
    pub fn data(&self) -> &C {
        &self.data
    }

    /// The extended state, mutably.
    pub fn data_mut(&mut self) -> &mut C {
        &mut self.data
    }

    /// Consume the instance and return its extended state.
    pub fn into_data(self) -> C {
        self.data
    }

    /// Run the entry actions of the initial configuration, outer→inner.
    ///
    /// Only the first call has an effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let chart = self.chart;
        tracing::trace!(
            chart = chart.name(),
            state = chart.hierarchy().name(self.current),
            "starting statechart"
        );
        for state in chart.hierarchy().path(self.current) {
            if let Some(action) = chart.on_enter(state) {
                action(&mut self.context(state));
            }
        }
    }

    /// Queue a trigger.
    ///
    /// Panics if `kind` is not declared in the chart or if the queue is full.
    /// Callers own backpressure.
    ///
    /// The payload is stored and handed to the reaction as is. Nothing checks that it carries
    /// the fields declared for `kind`; keeping the two in agreement is up to the caller.
    pub fn post(&mut self, kind: TriggerKind, payload: P) {
        post_into(
            self.chart.catalog(),
            &mut self.queue,
            &mut self.pool,
            kind,
            payload,
        );
    }

    /// Queue a trigger by kind name.
    ///
    /// Panics if no kind has this name, or under the same conditions as [`Machine::post`].
    pub fn post_named(&mut self, name: &str, payload: P) {
        let kind = lookup_kind(self.chart.catalog(), name);
        self.post(kind, payload);
    }

    /// Dispatch at most one queued trigger.
    pub fn run_step(&mut self) -> Step {
        if self.queue.is_empty() {
            return Step::Idle;
        }
        let handle = self.queue.dequeue();
        let trigger = self.pool.take(handle);
        let kind = trigger.kind;
        let chart = self.chart;

        let Some((by, handler)) = chart.resolve(self.current, kind) else {
            tracing::debug!(
                chart = chart.name(),
                trigger = chart.catalog().name(kind),
                state = chart.hierarchy().name(self.current),
                "unhandled trigger discarded"
            );
            return Step::Unhandled { kind };
        };

        tracing::trace!(
            chart = chart.name(),
            trigger = chart.catalog().name(kind),
            state = chart.hierarchy().name(self.current),
            handler = chart.hierarchy().name(by),
            "dispatching trigger"
        );
        if let Some(action) = handler.action {
            action(&mut self.context(by), &trigger);
        }
        let transition = handler.target.map(|target| self.transition_to(target));
        Step::Handled {
            kind,
            by,
            transition,
        }
    }

    /// Dispatch until the queue is empty, including triggers posted along the way.
    ///
    /// Returns the number of triggers dispatched.
    pub fn run_to_quiescence(&mut self) -> usize {
        let mut steps = 0;
        while !matches!(self.run_step(), Step::Idle) {
            steps += 1;
        }
        steps
    }

    fn transition_to(&mut self, target: StateId) -> Transition {
        let chart = self.chart;
        let from = self.current;
        let (exits, entries) = chart.hierarchy().transition_path(from, target);
        tracing::trace!(
            chart = chart.name(),
            from = chart.hierarchy().name(from),
            to = chart.hierarchy().name(target),
            "transition"
        );
        for state in exits {
            if let Some(action) = chart.on_exit(state) {
                action(&mut self.context(state));
            }
        }
        for state in entries {
            if let Some(action) = chart.on_enter(state) {
                action(&mut self.context(state));
            }
        }
        self.current = target;
        Transition { from, to: target }
    }

    fn context(&mut self, state: StateId) -> Context<'_, C, P> {
        Context {
            data: &mut self.data,
            queue: &mut self.queue,
            pool: &mut self.pool,
            catalog: self.chart.catalog(),
            hierarchy: self.chart.hierarchy(),
            state,
        }
    }
}

/// What an action sees while it runs: the extended state and a way to post triggers.
pub struct Context<'m, C, P> {
    data: &'m mut C,
    queue: &'m mut TriggerQueue,
    pool: &'m mut TriggerPool<P>,
    catalog: &'m TriggerCatalog,
    hierarchy: &'m StateHierarchy,
    state: StateId,
}

impl<C, P> core::fmt::Debug for Context<'_, C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.hierarchy.name(self.state))
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<C, P> Context<'_, C, P> {
    /// The extended state.
    pub fn data(&self) -> &C {
        &*self.data
    }

    /// The extended state, mutably.
    pub fn data_mut(&mut self) -> &mut C {
        &mut *self.data
    }

    /// State whose action is running: the handling state for reactions, or the state being
    /// entered or exited.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Name of [`Context::state`].
    pub fn state_name(&self) -> &str {
        self.hierarchy.name(self.state)
    }

    /// The chart's state tree, for ancestry checks inside actions.
    pub fn hierarchy(&self) -> &StateHierarchy {
        self.hierarchy
    }

    /// Queue a trigger; it is dispatched after the current step completes.
    ///
    /// Panics under the same conditions as [`Machine::post`], and like it does not check the
    /// payload against the kind.
    pub fn post(&mut self, kind: TriggerKind, payload: P) {
        post_into(self.catalog, self.queue, self.pool, kind, payload);
    }

    /// Queue a trigger by kind name.
    pub fn post_named(&mut self, name: &str, payload: P) {
        let kind = lookup_kind(self.catalog, name);
        self.post(kind, payload);
    }
}

fn lookup_kind(catalog: &TriggerCatalog, name: &str) -> TriggerKind {
    match catalog.find(name) {
        Some(kind) => kind,
        None => panic!("post of unknown trigger {name:?}"),
    }
}

fn post_into<P>(
    catalog: &TriggerCatalog,
    queue: &mut TriggerQueue,
    pool: &mut TriggerPool<P>,
    kind: TriggerKind,
    payload: P,
) {
    assert!(
        catalog.contains(kind),
        "post of unknown trigger kind {kind:?}"
    );
    // Check before touching the pool so an overflow never strands a payload.
    assert!(
        !queue.is_full(),
        "trigger queue overflow: {} pending of {} max",
        queue.len(),
        queue.max_len()
    );
    let handle = pool.insert(Trigger { kind, payload });
    queue.enqueue(handle);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::builder::{Reaction, StatechartBuilder};
    use alloc::format;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    type Log = Vec<String>;

    fn log_enter(cx: &mut Context<'_, Log, u32>) {
        let line = format!("enter {}", cx.state_name());
        cx.data_mut().push(line);
    }

    fn log_exit(cx: &mut Context<'_, Log, u32>) {
        let line = format!("exit {}", cx.state_name());
        cx.data_mut().push(line);
    }

    fn log_action(cx: &mut Context<'_, Log, u32>, t: &Trigger<u32>) {
        let line = format!("action {} {}", cx.state_name(), t.payload);
        cx.data_mut().push(line);
    }

    fn fanout(cx: &mut Context<'_, Log, u32>, _: &Trigger<u32>) {
        cx.post_named("Y", 1);
        cx.post_named("Y", 2);
        cx.data_mut().push("fanout done".into());
    }

    // Root
    // ├── A
    // │   └── B
    // └── C
    fn chart() -> Statechart<Log, u32> {
        StatechartBuilder::new("Test")
            .trigger("X", "")
            .trigger("Y", "n: u32")
            .trigger("Z", "")
            .trigger("Fanout", "")
            .state("Root", None)
            .state("A", Some("Root"))
            .state("B", Some("A"))
            .state("C", Some("Root"))
            .initial("B")
            .on("Root", "X", Reaction::new().action(log_action).target("A"))
            .on("A", "Y", Reaction::new().action(log_action).target("C"))
            .on("C", "Y", Reaction::new().action(log_action))
            .on(
                "B",
                "Fanout",
                Reaction::new().action(fanout).target("B"),
            )
            .on_enter("Root", log_enter)
            .on_enter("A", log_enter)
            .on_enter("B", log_enter)
            .on_enter("C", log_enter)
            .on_exit("A", log_exit)
            .on_exit("B", log_exit)
            .on_exit("C", log_exit)
            .build()
            .unwrap()
    }

    #[test]
    fn ancestor_handler_transitions_from_leaf() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        let a = chart.state("A").unwrap();
        let root = chart.state("Root").unwrap();
        let x = chart.trigger("X").unwrap();
        assert_eq!(m.current_state(), chart.state("B").unwrap());

        m.post(x, 7);
        let step = m.run_step();
        assert_eq!(
            step,
            Step::Handled {
                kind: x,
                by: root,
                transition: Some(Transition {
                    from: chart.state("B").unwrap(),
                    to: a
                }),
            }
        );
        assert_eq!(m.current_state(), a);
        assert_eq!(
            m.data(),
            &vec!["action Root 7", "exit B", "exit A", "enter A"]
        );
    }

    #[test]
    fn exits_inner_to_outer_then_enters_outer_to_inner() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post_named("Y", 3);
        m.run_step();
        assert_eq!(m.current_state(), chart.state("C").unwrap());
        assert_eq!(
            m.data(),
            &vec!["action A 3", "exit B", "exit A", "enter C"]
        );
    }

    #[test]
    fn unhandled_trigger_is_discarded() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        let z = chart.trigger("Z").unwrap();
        m.post(z, 0);
        assert_eq!(m.run_step(), Step::Unhandled { kind: z });
        assert_eq!(m.current_state(), chart.state("B").unwrap());
        assert!(m.data().is_empty());
        assert_eq!(m.run_step(), Step::Idle);
    }

    #[test]
    fn triggers_posted_by_actions_run_after_the_step() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post_named("Fanout", 0);
        assert!(matches!(m.run_step(), Step::Handled { .. }));
        // The self-transition on B finished before either Y was dispatched.
        assert_eq!(m.data(), &vec!["fanout done", "exit B", "enter B"]);
        assert_eq!(m.pending(), 2);

        assert_eq!(m.run_to_quiescence(), 2);
        assert_eq!(
            m.into_data(),
            vec![
                "fanout done",
                "exit B",
                "enter B",
                "action A 1",
                "exit B",
                "exit A",
                "enter C",
                "action C 2",
            ]
        );
    }

    #[test]
    fn start_enters_initial_path_once() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.start();
        m.start();
        assert_eq!(m.data(), &vec!["enter Root", "enter A", "enter B"]);
        assert!(m.is_in(chart.state("A").unwrap()));
        assert!(!m.is_in(chart.state("C").unwrap()));
    }

    #[test]
    fn run_to_quiescence_counts_unhandled_too() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post_named("Z", 0);
        m.post_named("X", 0);
        m.post_named("Z", 0);
        assert_eq!(m.run_to_quiescence(), 3);
        assert_eq!(m.pending(), 0);
        assert_eq!(m.current_state(), chart.state("A").unwrap());
    }

    #[test]
    fn queue_holds_capacity_minus_one() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        for i in 0..31 {
            m.post_named("Z", i);
        }
        assert_eq!(m.pending(), 31);
        assert_eq!(m.run_to_quiescence(), 31);
    }

    #[test]
    #[should_panic(expected = "trigger queue overflow")]
    fn posting_past_capacity_panics() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        for i in 0..32 {
            m.post_named("Z", i);
        }
    }

    #[test]
    fn overflow_leaves_no_orphaned_payload() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        for i in 0..31 {
            m.post_named("Z", i);
        }
        let overflow = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            m.post_named("Z", 31);
        }));
        assert!(overflow.is_err(), "posting into a full queue must panic");
        assert_eq!(m.pool.len(), 31);
        assert_eq!(m.pool.len(), m.queue.len());

        assert_eq!(m.run_to_quiescence(), 31);
        assert!(m.queue.is_empty());
        assert!(m.pool.is_empty());
    }

    #[test]
    fn pool_tracks_queue_while_actions_post() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post_named("Fanout", 0);
        m.post_named("Z", 0);
        assert_eq!(m.pool.len(), m.queue.len());

        // Fanout is consumed and posts two more behind Z.
        assert!(matches!(m.run_step(), Step::Handled { .. }));
        assert_eq!(m.pending(), 3);
        assert_eq!(m.pool.len(), m.queue.len());

        while m.run_step() != Step::Idle {
            assert_eq!(m.pool.len(), m.queue.len());
        }
        assert!(m.pool.is_empty());
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Input {
        Play,
        Stop,
    }

    fn record_input(cx: &mut Context<'_, Vec<Input>, Input>, t: &Trigger<Input>) {
        cx.data_mut().push(t.payload);
    }

    #[test]
    fn payload_is_delivered_unchecked() {
        let chart = StatechartBuilder::<Vec<Input>, Input>::new("Inputs")
            .trigger("Play", "")
            .trigger("Stop", "")
            .state("Root", None)
            .initial("Root")
            .on("Root", "Play", Reaction::new().action(record_input))
            .on("Root", "Stop", Reaction::new().action(record_input))
            .build()
            .unwrap();
        let mut m = chart.instance(Vec::new());
        let play = chart.trigger("Play").unwrap();
        m.post_named("Play", Input::Play);
        m.post_named("Play", Input::Stop);
        let handled = Step::Handled {
            kind: play,
            by: chart.initial_state(),
            transition: None,
        };
        assert_eq!(m.run_step(), handled);
        assert_eq!(m.run_step(), handled);
        assert_eq!(m.into_data(), vec![Input::Play, Input::Stop]);
    }

    #[test]
    #[should_panic(expected = "unknown trigger kind")]
    fn posting_foreign_kind_panics() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post(TriggerKind::new(99), 0);
    }

    #[test]
    #[should_panic(expected = "unknown trigger \"Nope\"")]
    fn posting_unknown_name_panics() {
        let chart = chart();
        let mut m = chart.instance(Log::new());
        m.post_named("Nope", 0);
    }
}
