// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use timeline360::params::{evaluate, ParameterTable};
use timeline360::timeline::Tokenizer;
use timeline360::{analyze, Compiler, CompilerConfig, Unit};

/// A timeline with `ribs` parallel sketches and a loft through them
fn wing_timeline(ribs: usize) -> String {
    let mut source = String::from("parameters\nchord, 120\nthickness, chord * 0.12\n");
    for i in 0..ribs {
        source.push_str(&format!(
            "\nsketch, csv/wing, rib\noffset_plane, z, {}\nspline, cross_rails, lead\n\
             0, 0\n$chord / 4, $thickness / 2, 10, 0.5\n$chord, 0\n",
            i * 25
        ));
    }
    source.push_str("\nloft, csv/wing, skin\nprofiles\n");
    for i in 0..ribs.max(2) {
        source.push_str(&format!("z_{}_rib\n", i * 25));
    }
    source
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for ribs in [10, 100] {
        let source = wing_timeline(ribs);
        group.bench_with_input(BenchmarkId::new("wing", ribs), &source, |b, source| {
            b.iter(|| Tokenizer::new(black_box(source)).count());
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let table = ParameterTable::new();

    group.bench_function("arithmetic", |b| {
        b.iter(|| evaluate(black_box("1 + 2 * 3 - 4 / 2 ** 2"), &table).unwrap());
    });

    group.bench_function("functions", |b| {
        b.iter(|| evaluate(black_box("sqrt(2) * sin(pi / 4) + hypot(3, 4)"), &table).unwrap());
    });

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for ribs in [10, 100] {
        let source = wing_timeline(ribs);
        group.bench_with_input(BenchmarkId::new("analyze", ribs), &source, |b, source| {
            b.iter(|| analyze("wing.txt", black_box(source), Unit::Mm).unwrap());
        });
    }

    let source = wing_timeline(20);
    group.bench_function("write_20", |b| {
        let dir = tempfile::TempDir::new().unwrap();
        b.iter(|| {
            let mut compiler = Compiler::new(CompilerConfig::with_output_dir(dir.path()));
            compiler.compile_source("wing.txt", black_box(&source)).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_evaluate, bench_compile);
criterion_main!(benches);
