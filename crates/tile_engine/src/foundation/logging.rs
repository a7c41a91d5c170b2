//! Logging utilities and structured logging support
//!
//! Library code only talks to the `log` facade. Binaries call [`init`] once
//! at startup to install `env_logger` as the backend.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Respects `RUST_LOG`; defaults to `info` when the variable is unset.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Initialize logging for tests (safe to call more than once)
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
