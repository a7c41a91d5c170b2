//! Level data errors

use thiserror::Error;

/// Fatal problems with level or asset description data
///
/// Any of these aborts the level load: the data is treated as
/// unrecoverable and is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// A placement or object points at a map entry that does not exist
    #[error("Corrupt map reference: placement {placement} does not exist (map has {map_len} entries)")]
    CorruptMapReference {
        /// Requested map index
        placement: usize,
        /// Number of map entries
        map_len: usize,
    },

    /// A map placement names an asset missing from the asset library
    #[error("Map placement {placement} references unknown asset '{asset}'")]
    UnknownAsset {
        /// Map index
        placement: usize,
        /// Missing asset name
        asset: String,
    },

    /// An object adopts a sub-placement the placed asset does not declare
    #[error("Object '{object}' references missing sub-placement '{reference}' of map placement {placement}")]
    InvalidSubPlacement {
        /// Object id
        object: String,
        /// Map index
        placement: usize,
        /// Reference id
        reference: String,
    },

    /// Two objects declare the same id
    #[error("Duplicate object id '{0}'")]
    DuplicateObjectId(String),
}
