//! Benchmark suite for taskgate hot paths.
//!
//! Every hook invocation re-reads the active task document, so parsing and
//! the full decide path must stay cheap on large documents:
//! - Gate parsing and summaries
//! - Root resolution from deep directories
//! - The hook decision (root, session, document, policy)
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::path::PathBuf;
use taskgate::policy::{decide, ActionKind};
use taskgate::session::{ActiveTask, SessionStore};
use taskgate::state::TaskStateMachine;
use taskgate::{parse_gates, resolve_root, summarize, ProjectRoot, TaskId};
use tempfile::TempDir;

// ============================================================================
// Gate Parsing Benchmarks
// ============================================================================

/// Task document with `gates` checkbox lines mixed with prose and references.
fn task_document(gates: usize) -> String {
    let mut doc = String::from("# 001 - Bench\n\n## Status\npending\n\n## Work Plan\n");
    for i in 0..gates {
        let mark = if i < gates / 2 { "x" } else { " " };
        doc.push_str(&format!("- [{mark}] Gate number {i} with some descriptive text\n"));
        if i % 5 == 0 {
            doc.push_str(&format!("  See [{i}] for background.\n\nProse paragraph {i}.\n"));
        }
    }
    doc
}

fn bench_parse_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_gates");

    for size in [10, 100, 1000] {
        let doc = task_document(size);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", size), &doc, |b, doc| {
            b.iter(|| black_box(parse_gates(black_box(doc))));
        });
        group.bench_with_input(BenchmarkId::new("parse_and_summarize", size), &doc, |b, doc| {
            b.iter(|| black_box(summarize(&parse_gates(black_box(doc)))));
        });
    }

    group.finish();
}

// ============================================================================
// Decision Path Benchmarks
// ============================================================================

/// Project with one active task, plus a nested working directory.
fn active_project(gates: usize, depth: usize) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let task_dir = temp.path().join(".agent/tasks/001-bench");
    fs::create_dir_all(&task_dir).expect("create task dir");
    fs::write(task_dir.join("task.md"), task_document(gates)).expect("write task");

    let root = ProjectRoot::new(temp.path().canonicalize().expect("canonicalize"));
    SessionStore::new(&root, None)
        .save(&ActiveTask::new(TaskId::new(1)))
        .expect("save session");

    let mut cwd = temp.path().to_path_buf();
    for level in 0..depth {
        cwd.push(format!("level{level}"));
    }
    fs::create_dir_all(&cwd).expect("create nested dir");
    (temp, cwd)
}

fn bench_resolve_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_root");

    for depth in [0, 5, 20] {
        let (_temp, cwd) = active_project(3, depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), &cwd, |b, cwd| {
            b.iter(|| black_box(resolve_root(black_box(cwd))));
        });
    }

    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    for size in [10, 1000] {
        let (_temp, cwd) = active_project(size, 3);
        group.bench_with_input(BenchmarkId::new("edit_code", size), &cwd, |b, cwd| {
            b.iter(|| {
                let root = resolve_root(cwd);
                let active = root
                    .as_ref()
                    .and_then(|r| SessionStore::new(r, None).load())
                    .map(|a| a.task_id);
                let machine = TaskStateMachine::resume(root, active);
                black_box(decide(ActionKind::EditCode, &machine.engine_state()))
            });
        });
    }

    group.finish();
}

criterion_group!(gate_benches, bench_parse_gates);

criterion_group!(decision_benches, bench_resolve_root, bench_decide);

criterion_main!(gate_benches, decision_benches);
