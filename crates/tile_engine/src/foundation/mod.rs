//! Foundation module - shared building blocks
//!
//! - [`math`]: nalgebra aliases and [`math::Transform`]
//! - [`collections`]: slotmap keys for callbacks, obstacles and nav links
//! - [`logging`]: `log` re-exports and the `env_logger` bootstrap

pub mod math;
pub mod collections;
pub mod logging;
