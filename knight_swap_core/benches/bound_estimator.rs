use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use knight_swap_core::board_state::BoardState;
use knight_swap_core::instance::{AreaCorners, InstanceBuilder};
use knight_swap_core::search::bound::{initial_upper_bound, lower_bound};
use knight_swap_core::search::root_splitter::split_roots;
use knight_swap_core::search::global_state::GlobalState;

fn area(col1: i64, row1: i64, col2: i64, row2: i64) -> AreaCorners {
    AreaCorners {
        col1,
        row1,
        col2,
        row2,
    }
}

fn bench_initial_upper_bound(c: &mut Criterion) {
    let inst = InstanceBuilder::new(6, 6, 3, area(0, 0, 0, 2), area(5, 3, 5, 5))
        .build()
        .unwrap();
    let state = BoardState::initial(&inst);

    c.bench_function("initial_upper_bound_6x6_k3", |b| {
        b.iter(|| black_box(initial_upper_bound(&inst, &state)))
    });
}

fn bench_lower_bound_recompute(c: &mut Criterion) {
    let inst = InstanceBuilder::new(6, 6, 3, area(0, 0, 0, 2), area(5, 3, 5, 5))
        .build()
        .unwrap();
    let state = BoardState::initial(&inst);

    c.bench_function("lower_bound_recompute_6x6_k3", |b| {
        b.iter(|| black_box(lower_bound(&inst, &state)))
    });
}

fn bench_root_splitter(c: &mut Criterion) {
    let inst = InstanceBuilder::new(6, 6, 3, area(0, 0, 0, 2), area(5, 3, 5, 5))
        .build()
        .unwrap();

    c.bench_function("root_splitter_6x6_k3_min24", |b| {
        b.iter(|| {
            let state = BoardState::initial(&inst);
            let u0 = initial_upper_bound(&inst, &state);
            let global = GlobalState::new(u0, state.lower_bound);
            black_box(split_roots(&inst, state, 0, &global, 24))
        })
    });
}

criterion_group!(
    benches,
    bench_initial_upper_bound,
    bench_lower_bound_recompute,
    bench_root_splitter
);
criterion_main!(benches);
