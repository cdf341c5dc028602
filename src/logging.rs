//! Log output for huddle binaries.
//!
//! Lines go to stderr with their source location:
//!
//! ```text
//! 2026-02-11T21:33:12.000Z  INFO src/chat.rs:121: group created conversation=4 creator=1
//! ```
//!
//! The filter comes from `HUDDLE_LOG`, then `RUST_LOG`, defaulting to `info`.
//! ANSI colour is used only when stderr is a terminal.

use std::io::{self, IsTerminal};

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HUDDLE_LOG";
const DEFAULT_FILTER: &str = "info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once at startup; later calls are no-ops.
pub fn init() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal());

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(stderr_layer)
        .try_init();
}
