//! Process tree core library.
//!
//! This library provides everything behind the `ptree` binary:
//! - Process collection from `/proc` or a replayed snapshot
//! - Forest construction with cycle breaking and orphan re-rooting
//! - Lazy tree rendering, styling, and summary blocks
//! - Continuous monitoring and file export
//! - Configuration, logging, and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod export;
pub mod interrupt;
pub mod logging;
pub mod monitor;
pub mod render;
pub mod tree;
