//! `ProcfsSource` against a fake proc tree in a temp directory.
//!
//! The fixture is written for 100 Hz clock ticks and 4 KiB pages, which the
//! source is told about explicitly so results do not depend on the host.

#![cfg(target_os = "linux")]

use pt_common::ProcessId;
use pt_core::collect::{
    collect_snapshot, MissingReason, ProcessSource, ProcessStatus, ProcfsSource, ReadError,
    SnapshotOptions, SourceError,
};
use pt_core::tree::build_forest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BOOT_TIME: i64 = 1_700_000_000;

#[allow(clippy::too_many_arguments)]
fn stat_line(
    pid: u32,
    comm: &str,
    state: char,
    ppid: u32,
    utime: u64,
    stime: u64,
    threads: u32,
    start: u64,
    rss_pages: u64,
) -> String {
    format!(
        "{pid} ({comm}) {state} {ppid} {pid} {pid} 0 -1 4194304 0 0 0 0 {utime} {stime} 0 0 20 0 {threads} 0 {start} 1000000 {rss_pages} 18446744073709551615 0 0\n"
    )
}

fn write_process(root: &Path, pid: u32, stat: &str, uid: Option<u32>, cmdline: &[u8]) {
    let dir = root.join(pid.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("stat"), stat).unwrap();
    if let Some(uid) = uid {
        fs::write(
            dir.join("status"),
            format!("Name:\tx\nState:\tS (sleeping)\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\n"),
        )
        .unwrap();
    }
    fs::write(dir.join("cmdline"), cmdline).unwrap();
}

struct Fixture {
    _dir: TempDir,
    source: ProcfsSource,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("proc");
    fs::create_dir_all(&root).unwrap();

    fs::write(
        root.join("stat"),
        format!("cpu  1 2 3 4\nbtime {}\nprocesses 42\n", BOOT_TIME),
    )
    .unwrap();
    fs::write(root.join("uptime"), "1000.00 3000.00\n").unwrap();
    fs::create_dir_all(root.join("self")).unwrap();

    write_process(
        &root,
        1,
        &stat_line(1, "systemd", 'S', 0, 200, 100, 1, 100, 2500),
        Some(0),
        b"/sbin/init\0splash\0",
    );
    write_process(
        &root,
        2,
        &stat_line(2, "kthreadd", 'S', 0, 0, 0, 1, 2, 0),
        Some(0),
        b"",
    );
    write_process(
        &root,
        3,
        &stat_line(3, "kworker/0:1-events", 'I', 2, 0, 5, 1, 3, 0),
        Some(0),
        b"",
    );
    write_process(
        &root,
        42,
        &stat_line(42, "my (odd) worker", 'R', 1, 5000, 0, 4, 10_000, 25_600),
        None,
        b"/usr/bin/worker\0--fast\0",
    );
    write_process(
        &root,
        43,
        &stat_line(43, "child", 'Z', 42, 0, 0, 1, 20_000, 0),
        Some(1000),
        b"",
    );
    write_process(&root, 77, "garbage without parens", Some(0), b"");
    fs::create_dir_all(root.join("88")).unwrap();

    let passwd = dir.path().join("passwd");
    fs::write(
        &passwd,
        "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000::/home/alice:/bin/sh\n",
    )
    .unwrap();

    let source = ProcfsSource::new(&root)
        .with_passwd(&passwd)
        .with_units(100, 4096);
    Fixture { _dir: dir, source }
}

#[test]
fn lists_numeric_entries_in_order() {
    let fx = fixture();
    let pids = fx.source.list_pids().unwrap();
    assert_eq!(pids, [1, 2, 3, 42, 43, 77, 88].map(ProcessId).to_vec());
}

#[test]
fn reads_full_record() {
    let fx = fixture();
    fx.source.list_pids().unwrap();
    let record = fx.source.read(ProcessId(1)).unwrap();

    assert_eq!(record.name, "systemd");
    assert_eq!(record.ppid, ProcessId(0));
    assert_eq!(record.status, ProcessStatus::Sleeping);
    assert_eq!(record.owner(), "root");
    assert_eq!(record.cmdline, "/sbin/init splash");
    assert_eq!(record.rss(), 2500 * 4096);
    assert_eq!(record.thread_count(), 1);
    assert_eq!(record.start_time.value(), Some(&(BOOT_TIME + 1)));
    // 3 s of CPU over 999 s of life
    assert!((record.cpu() - 0.3003).abs() < 0.001, "cpu = {}", record.cpu());
}

#[test]
fn comm_with_parens_and_missing_status() {
    let fx = fixture();
    fx.source.list_pids().unwrap();
    let record = fx.source.read(ProcessId(42)).unwrap();

    assert_eq!(record.name, "my (odd) worker");
    assert_eq!(record.status, ProcessStatus::Running);
    assert_eq!(record.memory_mb(), 100.0);
    assert_eq!(record.cmdline, "/usr/bin/worker --fast");
    assert_eq!(record.user.missing_reason(), Some(MissingReason::Exited));
    assert_eq!(record.owner(), "<unknown>");
    assert!(record.is_incomplete());
    // 50 s of CPU over 900 s of life
    assert!((record.cpu() - 5.5556).abs() < 0.001, "cpu = {}", record.cpu());
}

#[test]
fn unparseable_or_missing_stat_reads_as_exited() {
    let fx = fixture();
    assert_eq!(fx.source.read(ProcessId(77)), Err(ReadError::NotFound(ProcessId(77))));
    assert_eq!(fx.source.read(ProcessId(88)), Err(ReadError::NotFound(ProcessId(88))));
    assert_eq!(fx.source.read(ProcessId(999)), Err(ReadError::NotFound(ProcessId(999))));
}

#[test]
fn snapshot_hides_kernel_threads_on_request() {
    let fx = fixture();

    let all = collect_snapshot(&fx.source, &SnapshotOptions::default()).unwrap();
    assert_eq!(all.metadata.source, "procfs");
    assert_eq!(all.metadata.listed, 7);
    assert_eq!(all.metadata.collected, 5);
    assert_eq!(all.metadata.vanished, 2);
    assert_eq!(all.metadata.inaccessible, 0);
    assert_eq!(all.records.len(), 5);

    let options = SnapshotOptions {
        hide_kernel_threads: true,
    };
    let user = collect_snapshot(&fx.source, &options).unwrap();
    assert_eq!(user.metadata.kernel_threads_hidden, 2);
    let pids: Vec<u32> = user.records.iter().map(|r| r.pid.0).collect();
    assert_eq!(pids, vec![1, 42, 43]);

    let forest = build_forest(user.records);
    assert_eq!(forest.roots().len(), 1);
    let worker = forest.get(ProcessId(42)).unwrap();
    assert_eq!(worker.children().len(), 1);
}

#[test]
fn unknown_uid_falls_back_to_number() {
    let fx = fixture();
    let dir = fx.source.root().join("44");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("stat"), stat_line(44, "svc", 'S', 1, 0, 0, 1, 50, 10)).unwrap();
    fs::write(dir.join("status"), "Uid:\t4242\t4242\t4242\t4242\n").unwrap();

    let record = fx.source.read(ProcessId(44)).unwrap();
    assert_eq!(record.owner(), "4242");
    assert_eq!(record.cmdline, "");
}

#[test]
fn missing_root_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let source = ProcfsSource::new(dir.path().join("not-mounted"));
    let err = source.list_pids().unwrap_err();
    assert!(matches!(err, SourceError::Enumerate { .. }));
    let mapped = pt_common::Error::from(err);
    assert_eq!(mapped.code(), 20);
}
