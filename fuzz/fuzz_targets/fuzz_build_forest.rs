//! Fuzz target for forest construction over arbitrary parent links.
//!
//! Any pid/ppid table, including cycles, self-parents and duplicates, must
//! build and render without panicking, and every record must be reachable.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pt_core::collect::ProcessRecord;
use pt_core::render::{RenderOptions, TreeLines};
use pt_core::tree::build_forest;

fuzz_target!(|links: Vec<(u16, u16)>| {
    let records: Vec<ProcessRecord> = links
        .iter()
        .map(|&(pid, ppid)| ProcessRecord::new(u32::from(pid), u32::from(ppid), "p"))
        .collect();

    let forest = build_forest(records);
    assert_eq!(forest.walk().len(), forest.len());

    let options = RenderOptions::default();
    let rendered = TreeLines::new(&forest, forest.roots().to_vec(), &options).count();
    assert_eq!(rendered, forest.len());
});
