//! Criterion benchmarks for forest construction and rendering.
//!
//! Uses a synthetic process table so runs are deterministic and never touch
//! the real `/proc`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pt_core::collect::{ProcessRecord, ProcessStatus};
use pt_core::render::{RenderOptions, TreeLines};
use pt_core::tree::{build_forest, find_matches, ForestStats, Query};

/// A bushy table: each process hangs off one of the previous 16, plus an
/// orphan and a two-process cycle.
fn synthetic_table(count: u32) -> Vec<ProcessRecord> {
    let mut records = Vec::with_capacity(count as usize + 3);
    records.push(ProcessRecord::new(1, 0, "init").with_status(ProcessStatus::Sleeping));
    for pid in 2..=count {
        let window = (pid - 1).min(16);
        let ppid = pid - 1 - (pid * 7919) % window;
        records.push(
            ProcessRecord::new(pid, ppid, format!("worker-{}", pid % 97))
                .with_status(if pid % 5 == 0 {
                    ProcessStatus::Running
                } else {
                    ProcessStatus::Sleeping
                })
                .with_cpu(f64::from(pid % 60))
                .with_rss(u64::from(pid) * 4096 * 37)
                .with_threads(1 + pid % 8)
                .with_start_time(1_700_000_000 + i64::from(pid))
                .with_cmdline(format!("/usr/bin/worker --id {} --pool default", pid)),
        );
    }
    records.push(ProcessRecord::new(count + 1, 999_999, "orphan"));
    records.push(ProcessRecord::new(count + 2, count + 3, "cycle-a"));
    records.push(ProcessRecord::new(count + 3, count + 2, "cycle-b"));
    records
}

fn bench_build_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_forest");
    for count in [500u32, 5_000] {
        let table = synthetic_table(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &table, |b, table| {
            b.iter(|| {
                let forest = build_forest(black_box(table.clone()));
                black_box(forest.len());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let forest = build_forest(synthetic_table(5_000));
    let plain = RenderOptions::default();
    let verbose = RenderOptions {
        resources: true,
        verbose: true,
        now: 1_700_010_000,
        ..RenderOptions::default()
    };

    let mut group = c.benchmark_group("render");
    for (name, options) in [("plain", &plain), ("verbose", &verbose)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let bytes: usize = TreeLines::new(&forest, forest.roots().to_vec(), options)
                    .map(|line| line.render(true).len())
                    .sum();
                black_box(bytes);
            });
        });
    }
    group.finish();
}

fn bench_search_and_stats(c: &mut Criterion) {
    let forest = build_forest(synthetic_table(5_000));
    let query = Query::parse("worker-4");

    c.bench_function("search/name_substring", |b| {
        b.iter(|| black_box(find_matches(&forest, black_box(&query)).len()));
    });
    c.bench_function("stats/compute", |b| {
        b.iter(|| black_box(ForestStats::compute(&forest)));
    });
}

criterion_group!(benches, bench_build_forest, bench_render, bench_search_and_stats);
criterion_main!(benches);
