#![allow(clippy::needless_range_loop)]

/// Use mimalloc as the global allocator for all binaries.
/// The dataset and the output batch buffers are large, short-lived
/// allocations that mimalloc returns to the OS promptly.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod generate;
pub mod hexfmt;
pub mod verify;

/// Tool name used as the prefix of every diagnostic.
pub const TOOL_NAME: &str = "initdatagen";
