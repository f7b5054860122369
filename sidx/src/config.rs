//! Index configuration built from caller-supplied key/value pairs.
//!
//! The configuration is assembled once at wrapper construction time and
//! consumed by the engine when the index is opened. Unrecognized keys and
//! values are ignored without error; callers relying on a setting taking
//! effect should verify it through `dimension()` after opening.

use std::collections::HashMap;
use std::path::PathBuf;

/// The kind of spatial index to create. R-Tree is the only supported kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    #[default]
    RTree,
}

/// Where the engine keeps its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Disk,
}

/// Node-split heuristic applied when an R-Tree node overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitVariant {
    #[default]
    RStar,
    Linear,
    Quadratic,
}

/// An opaque property set consumed exactly once by index creation.
///
/// Defaults describe an in-memory 2D R*-tree, the same index the engine
/// builds when no configuration is supplied at all.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub index_type: IndexType,
    pub storage: StorageKind,
    pub filename: Option<PathBuf>,
    pub variant: SplitVariant,
    pub dimension: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            index_type: IndexType::RTree,
            storage: StorageKind::Memory,
            filename: None,
            variant: SplitVariant::RStar,
            dimension: 2,
        }
    }
}

impl IndexConfig {
    /// Builds a configuration from a key/value mapping.
    ///
    /// Recognized keys: `type` (`rtree`), `storage` (`memory`/`disk`, the
    /// latter consulting `filename`), `variant` (`rstar`/`linear`/
    /// `quadratic`), `dimension` (`2`/`3`). Anything else is skipped.
    pub fn from_map(params: &HashMap<String, String>) -> Self {
        let mut config = IndexConfig::default();
        for (key, value) in params {
            match (key.as_str(), value.as_str()) {
                ("type", "rtree") => config.index_type = IndexType::RTree,
                ("storage", "memory") => config.storage = StorageKind::Memory,
                ("storage", "disk") => {
                    config.storage = StorageKind::Disk;
                    config.filename = params.get("filename").map(PathBuf::from);
                }
                ("variant", "rstar") => config.variant = SplitVariant::RStar,
                ("variant", "linear") => config.variant = SplitVariant::Linear,
                ("variant", "quadratic") => config.variant = SplitVariant::Quadratic,
                ("dimension", "2") => config.dimension = 2,
                ("dimension", "3") => config.dimension = 3,
                // Consumed when storage=disk is seen, never on its own.
                ("filename", _) => {}
                (key, value) => {
                    log::debug!("ignoring unrecognized index configuration {}={}", key, value);
                }
            }
        }
        config
    }
}

/// Translates the optional caller-supplied mapping into a pending
/// configuration. `None` signals "use the default in-memory R*-tree when
/// the index is opened".
pub(crate) fn build_config(params: Option<&HashMap<String, String>>) -> Option<IndexConfig> {
    match params {
        Some(map) if !map.is_empty() => Some(IndexConfig::from_map(map)),
        _ => None,
    }
}
