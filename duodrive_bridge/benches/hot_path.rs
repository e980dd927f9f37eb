//! Bridge hot-path micro-benchmark.
//!
//! Measures the calls the transport makes per frame:
//! - statusword decode (write hook)
//! - controlword plan (read hook)
//! - velocity check (supervisory poll)

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use duodrive_bridge::{DriveBridge, NullSink, OdExtension};
use duodrive_common::axis::{AxisId, NodeId};
use duodrive_common::od::{DriveEntry, EntryContext};

const RIGHT: NodeId = NodeId::new(0x0A);
const LEFT: NodeId = NodeId::new(0x0B);

/// Statuswords a drive reports while being brought up.
const BRING_UP: [u16; 4] = [0x0240, 0x0221, 0x0233, 0x0237];

fn bridge() -> DriveBridge<NullSink> {
    DriveBridge::with_nodes(RIGHT, LEFT, NullSink).expect("distinct nodes")
}

fn bench_decode(c: &mut Criterion) {
    let b = bridge();
    let mut i = 0usize;
    c.bench_function("decode", |bench| {
        bench.iter(|| {
            i = i.wrapping_add(1);
            b.decode(black_box(RIGHT), BRING_UP[i % BRING_UP.len()])
        });
    });
}

fn bench_plan(c: &mut Criterion) {
    let b = bridge();
    b.decode(LEFT, 0x0221).expect("known node");
    c.bench_function("plan", |bench| bench.iter(|| b.plan(black_box(AxisId::Left))));
}

fn bench_check(c: &mut Criterion) {
    let b = bridge();
    let mut v = 0i32;
    c.bench_function("check_changing", |bench| {
        bench.iter(|| {
            v = v.wrapping_add(1);
            b.check(AxisId::Right, black_box(v))
        });
    });
    c.bench_function("check_steady", |bench| {
        bench.iter(|| b.check(AxisId::Left, black_box(250)))
    });
}

fn bench_hooks(c: &mut Criterion) {
    let b = bridge();
    let status_ctx = EntryContext::new(RIGHT, DriveEntry::StatusWord);
    let control_ctx = EntryContext::new(RIGHT, DriveEntry::ControlWord);
    let status = 0x0233u16.to_le_bytes();
    let mut out = [0u8; 2];

    c.bench_function("status_write_control_read", |bench| {
        bench.iter(|| {
            b.on_write(Some(&status_ctx), Some(&status[..]));
            b.on_read(Some(&control_ctx), Some(&mut out[..]))
        });
    });
}

criterion_group!(benches, bench_decode, bench_plan, bench_check, bench_hooks);
criterion_main!(benches);
