//! Fuzz target for /proc/[pid]/stat parsing.
//!
//! Tests that `parse_stat_content` handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pt_core::collect::parse_stat_content;

fuzz_target!(|data: &str| {
    // The parser should never panic, only return an error for malformed input
    if let Ok(fields) = parse_stat_content(data) {
        assert!(data.contains(fields.comm.as_str()));
    }
});
