// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Statechart basics.
//!
//! This minimal example builds a three-level chart, posts a trigger that only the
//! root reacts to, and shows the innermost-first walk plus the exit/entry actions.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example statechart_basics`

use tracing_subscriber::EnvFilter;
use understory_statechart::builder::{Reaction, StatechartBuilder};
use understory_statechart::machine::Context;

fn enter(cx: &mut Context<'_, (), ()>) {
    println!("  enter {}", cx.state_name());
}

fn exit(cx: &mut Context<'_, (), ()>) {
    println!("  exit  {}", cx.state_name());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Root
    // └── A
    //     └── B
    let chart = StatechartBuilder::<(), ()>::new("Basics")
        .trigger("X", "")
        .trigger("Ignored", "")
        .state("Root", None)
        .state("A", Some("Root"))
        .state("B", Some("A"))
        .initial("B")
        .on(
            "Root",
            "X",
            Reaction::new()
                .action(|cx, _| println!("  X handled by {}", cx.state_name()))
                .target("A"),
        )
        .on_enter("Root", enter)
        .on_enter("A", enter)
        .on_enter("B", enter)
        .on_exit("A", exit)
        .on_exit("B", exit)
        .build()
        .expect("valid chart");

    let mut m = chart.instance(());
    println!("== Start ==");
    m.start();

    let b = m.current_state();
    let chain: Vec<&str> = chart
        .hierarchy()
        .ancestors(b)
        .map(|s| chart.hierarchy().name(s))
        .collect();
    println!("== Ancestor chain of {} ==", chart.hierarchy().name(b));
    println!("  {}", chain.join(" → "));

    println!("== Post X, then Ignored ==");
    m.post_named("X", ());
    m.post_named("Ignored", ());
    while m.pending() > 0 {
        let step = m.run_step();
        println!("  {step:?}");
    }
    println!(
        "== Current state: {} ==",
        chart.hierarchy().name(m.current_state())
    );
}
