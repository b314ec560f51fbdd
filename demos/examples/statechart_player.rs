// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed trigger payloads and run-to-completion.
//!
//! Triggers carry an application enum as payload; the catalog documents each kind's
//! fields. A reaction posts follow-up triggers, which only run after the reaction's
//! own transition has completed.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example statechart_player`

use tracing_subscriber::EnvFilter;
use understory_statechart::builder::{Reaction, StatechartBuilder};
use understory_statechart::machine::Context;
use understory_statechart::types::Trigger;

#[derive(Clone, Debug)]
enum Input {
    Play { track: u32 },
    Seek { seconds: i32 },
    Stop,
    Tick,
}

#[derive(Debug, Default)]
struct Player {
    track: u32,
    position: i32,
    log: Vec<String>,
}

fn on_play(cx: &mut Context<'_, Player, Input>, t: &Trigger<Input>) {
    if let Input::Play { track } = t.payload {
        cx.data_mut().track = track;
        cx.data_mut().position = 0;
        // Queued, not dispatched: these run after the transition into Playing.
        cx.post_named("Tick", Input::Tick);
        cx.post_named("Tick", Input::Tick);
    }
}

fn on_seek(cx: &mut Context<'_, Player, Input>, t: &Trigger<Input>) {
    if let Input::Seek { seconds } = t.payload {
        cx.data_mut().position += seconds;
    }
}

fn on_tick(cx: &mut Context<'_, Player, Input>, _: &Trigger<Input>) {
    cx.data_mut().position += 1;
}

fn record(cx: &mut Context<'_, Player, Input>) {
    let line = format!("enter {}", cx.state_name());
    cx.data_mut().log.push(line);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Powered
    // ├── Idle
    // └── Active
    //     ├── Playing
    //     └── Paused
    let chart = StatechartBuilder::<Player, Input>::new("Player")
        .trigger("Play", "track: u32")
        .trigger("Seek", "seconds: i32")
        .trigger("Stop", "")
        .trigger("Tick", "")
        .state("Powered", None)
        .state("Idle", Some("Powered"))
        .state("Active", Some("Powered"))
        .state("Playing", Some("Active"))
        .state("Paused", Some("Active"))
        .initial("Idle")
        .on(
            "Powered",
            "Play",
            Reaction::new().action(on_play).target("Playing"),
        )
        .on("Active", "Seek", Reaction::new().action(on_seek))
        .on("Active", "Stop", Reaction::new().target("Idle"))
        .on("Playing", "Tick", Reaction::new().action(on_tick))
        .on_enter("Idle", record)
        .on_enter("Active", record)
        .on_enter("Playing", record)
        .queue_capacity(8)
        .build()
        .expect("valid chart");

    println!("== Catalog ==");
    for (_, decl) in chart.catalog().iter() {
        let fields: Vec<String> = decl
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.ty))
            .collect();
        println!("  {}({})", decl.name, fields.join(", "));
    }

    let mut m = chart.instance(Player::default());
    m.start();
    m.post_named("Play", Input::Play { track: 3 });
    m.post_named("Seek", Input::Seek { seconds: 30 });
    m.post_named("Stop", Input::Stop);
    // Seek arrives in Idle after Stop: nobody handles it.
    m.post_named("Seek", Input::Seek { seconds: 5 });
    let steps = m.run_to_quiescence();
    tracing::info!(steps, state = chart.hierarchy().name(m.current_state()), "queue drained");

    let player = m.into_data();
    println!("== Dispatched {steps} triggers ==");
    println!("  track={} position={}", player.track, player.position);
    for line in &player.log {
        println!("  {line}");
    }
}
