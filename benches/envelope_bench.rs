//! Benchmarks for envelope construction and encoding
//!
//! Benchmarks:
//! - Building an invoke envelope for varying argument counts
//! - XDR wire encoding and decoding
//! - Transaction hash computation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ledger_call::codec::string_to_scval;
use ledger_call::config::CallPolicy;
use ledger_call::tx_builder::{EnvelopeExt, TransactionBuilder, TransactionEnvelope};
use ledger_call::types::{AccountState, CallArgs};

const PASSPHRASE: &str = "Test SDF Network ; September 2015";
const CALLER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
const CONTRACT: &str = "CADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP5KR";

fn account() -> AccountState {
    AccountState {
        account_id: CALLER.to_string(),
        sequence: 1_000,
    }
}

fn args(count: usize) -> CallArgs {
    CallArgs::Many(
        (0..count)
            .map(|i| string_to_scval(&format!("argument number {}", i)).unwrap())
            .collect(),
    )
}

fn envelope(arg_count: usize) -> TransactionEnvelope {
    let account = account();
    let policy = CallPolicy::default();
    TransactionBuilder::new(&account, &policy)
        .invoke(CONTRACT, "send_feedback", args(arg_count))
        .and_then(|b| b.build_at(1_700_000_000))
        .unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_build");
    let account = account();
    let policy = CallPolicy::default();

    for count in [0usize, 1, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                TransactionBuilder::new(&account, &policy)
                    .invoke(CONTRACT, "send_feedback", args(count))
                    .and_then(|b| b.build_at(black_box(1_700_000_000)))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let env = envelope(8);
    let wire = env.to_wire().unwrap();

    c.bench_function("envelope_to_wire", |b| {
        b.iter(|| black_box(&env).to_wire().unwrap())
    });
    c.bench_function("envelope_from_wire", |b| {
        b.iter(|| TransactionEnvelope::from_wire(black_box(&wire)).unwrap())
    });
}

fn bench_hash(c: &mut Criterion) {
    let env = envelope(8);
    c.bench_function("envelope_hash", |b| {
        b.iter(|| EnvelopeExt::hash(black_box(&env), black_box(PASSPHRASE)).unwrap())
    });
}

criterion_group!(benches, bench_build, bench_wire, bench_hash);
criterion_main!(benches);
