// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_statechart::builder::{Reaction, StatechartBuilder};
use understory_statechart::chart::Statechart;
use understory_statechart::machine::Context;
use understory_statechart::queue::RingBuffer;
use understory_statechart::types::Trigger;

fn bump(cx: &mut Context<'_, u64, u32>, t: &Trigger<u32>) {
    *cx.data_mut() += u64::from(t.payload);
}

/// A single chain `S0 → S1 → … → S{depth-1}` with the only handler on the root.
fn deep_chain(depth: usize) -> Statechart<u64, u32> {
    let names: Vec<String> = (0..depth).map(|i| format!("S{i}")).collect();
    let mut b = StatechartBuilder::<u64, u32>::new("Chain")
        .trigger("Bump", "by: u32")
        .trigger("Reset", "")
        .state(&names[0], None);
    for i in 1..depth {
        b = b.state(&names[i], Some(&names[i - 1]));
    }
    b.initial(&names[depth - 1])
        .on(&names[0], "Bump", Reaction::new().action(bump))
        .on(&names[0], "Reset", Reaction::new().target(&names[depth - 1]))
        .queue_capacity(1024)
        .build()
        .expect("valid chart")
}

fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    for &cap in &[32_usize, 1024] {
        group.throughput(Throughput::Elements((cap - 1) as u64));
        group.bench_function(format!("fill_drain_{cap}"), |b| {
            let mut q: RingBuffer<u32> = RingBuffer::new(cap);
            b.iter(|| {
                let mut i = 0;
                while !q.is_full() {
                    q.enqueue(i);
                    i += 1;
                }
                let mut sum = 0_u64;
                while !q.is_empty() {
                    sum += u64::from(q.dequeue());
                }
                black_box(sum);
            });
        });
    }
    group.finish();
}

fn bench_dispatch_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_depth");
    for &depth in &[1_usize, 8, 64] {
        let chart = deep_chain(depth);
        group.throughput(Throughput::Elements(1000));
        group.bench_function(format!("bump_x1000_depth_{depth}"), |b| {
            b.iter_batched(
                || chart.instance(0),
                |mut m| {
                    for chunk in 0..4 {
                        for i in 0..250 {
                            m.post_named("Bump", chunk * 250 + i);
                        }
                        m.run_to_quiescence();
                    }
                    black_box(*m.data());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_external_transition(c: &mut Criterion) {
    let chart = deep_chain(16);
    c.bench_function("reset_transition_depth_16", |b| {
        let mut m = chart.instance(0);
        b.iter(|| {
            m.post_named("Reset", 0);
            black_box(m.run_step());
        });
    });
}

criterion_group!(
    benches,
    bench_ring_buffer,
    bench_dispatch_depth,
    bench_external_transition,
);
criterion_main!(benches);
