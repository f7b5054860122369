//! The spatial-index engine boundary.
//!
//! The dispatcher core talks to the engine exclusively through the
//! [`SpatialEngine`] trait, mirroring the handle API of a C-style spatial
//! index library: create/destroy, insert, delete, intersection query with
//! handle-global result-set offset/limit state, bounds, and a version
//! string. The default implementation, [`RTreeEngine`], is backed by
//! `rstar`.

mod rtree;

pub use rtree::RTreeEngine;

use std::io;
use thiserror::Error;

use crate::config::IndexConfig;
use crate::marshal::Payload;

/// Errors raised by engine calls. The task layer renders these into the
/// operation-prefixed diagnostics callers see.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// One item produced by an intersection query. The payload's ownership has
/// been transferred out of the engine into this value.
#[derive(Debug, Clone)]
pub struct EngineItem {
    pub id: i64,
    pub payload: Option<Payload>,
}

/// The overall extent of every entry stored in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineBounds {
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
    pub dimension: u32,
}

/// The capabilities the asynchronous core requires of a spatial index
/// engine. One engine instance backs exactly one open index handle.
///
/// Implementations are not required to tolerate concurrent calls; the
/// dispatcher serializes all access to a handle.
pub trait SpatialEngine: Send {
    /// The dimensionality the index was created with.
    fn dimension(&self) -> u32;

    /// Inserts an entry. The payload moves into the engine.
    fn insert(
        &mut self,
        id: i64,
        mins: &[f64],
        maxs: &[f64],
        payload: Option<Payload>,
    ) -> EngineResult<()>;

    /// Removes the entry matching `id` and the exact MBR.
    fn delete(&mut self, id: i64, mins: &[f64], maxs: &[f64]) -> EngineResult<()>;

    /// Runs an intersection query against the given window, honoring the
    /// handle's current result-set offset/limit.
    fn intersects(&self, mins: &[f64], maxs: &[f64]) -> EngineResult<Vec<EngineItem>>;

    /// The overall extent of the stored entries.
    fn bounds(&self) -> EngineResult<EngineBounds>;

    fn result_set_offset(&self) -> u64;
    fn set_result_set_offset(&mut self, offset: u64);
    fn result_set_limit(&self) -> u64;
    fn set_result_set_limit(&mut self, limit: u64);

    /// Writes any buffered state through to backing storage.
    fn flush(&mut self) -> EngineResult<()>;
}

/// Creates an engine handle from a property set.
///
/// The configuration is logically consumed by the handle on success; on
/// failure the caller still owns it and remains responsible for its release.
pub fn open_engine(config: &IndexConfig) -> EngineResult<Box<dyn SpatialEngine>> {
    Ok(Box::new(RTreeEngine::open(config)?))
}

/// The engine's version string. Cannot fail.
pub fn version() -> String {
    format!("sidx {}", env!("CARGO_PKG_VERSION"))
}
