//! Level loading and the per-frame runtime
//!
//! A [`LevelLoader`] turns level data into a [`LoadedLevel`] over several
//! cooperative steps. [`LevelRuntime`] owns at most one ready level plus at
//! most one loader; starting a new load tears the current level down first,
//! so nothing can interact with a level that is half built.
//!
//! ```text
//! begin_load ─► LevelLoader::step ... ─► LoadedLevel ─► ready
//!                                   └──► LoadReport (failed)
//! update(dt): animations → trigger poll → obstacles → visibility
//! ```

mod loader;
mod runtime;

pub use loader::{LevelLoader, LoadReport, LoadStatus, LoadedLevel};
pub use runtime::{LevelRuntime, RuntimeEvent};

use crate::config::ConfigError;
use crate::content::LevelError;
use crate::trigger::TriggerError;
use thiserror::Error;

/// Errors surfaced by [`LevelRuntime`]
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Level data is unusable
    #[error(transparent)]
    Level(#[from] LevelError),

    /// A trigger invocation was rejected
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// Configuration could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Data files could not be read or parsed
    #[error("Failed to load '{path}': {message}")]
    Data {
        /// File path
        path: String,
        /// Reader or parser message
        message: String,
    },
}
