//! Ownership and lifecycle of the single engine handle behind an index.
//!
//! An `IndexResource` is in one of three states: unconfigured (no pending
//! configuration, no handle), configured (pending configuration, no handle),
//! or open (live handle; the configuration has been consumed by engine
//! creation). The interior mutex doubles as the per-resource critical
//! section: a task's whole execute phase runs under it, so operations
//! against one handle never overlap even though the pool runs tasks for
//! different resources in parallel.

use parking_lot::{Mutex, MutexGuard};

use crate::config::IndexConfig;
use crate::engine::{self, EngineResult, SpatialEngine};
use crate::errors::{SidxError, SidxResult};

pub(crate) struct ResourceState {
    config: Option<IndexConfig>,
    engine: Option<Box<dyn SpatialEngine>>,
}

impl ResourceState {
    pub(crate) fn engine_mut(&mut self) -> SidxResult<&mut dyn SpatialEngine> {
        match self.engine.as_mut() {
            Some(engine) => Ok(engine.as_mut()),
            None => Err(SidxError::NotOpen),
        }
    }
}

/// Owns at most one of {pending configuration, live engine handle}.
pub struct IndexResource {
    state: Mutex<ResourceState>,
}

impl IndexResource {
    pub fn new(config: Option<IndexConfig>) -> Self {
        IndexResource {
            state: Mutex::new(ResourceState {
                config,
                engine: None,
            }),
        }
    }

    /// Whether a live handle exists. Callers use this to fail fast with
    /// `NotOpen` before submitting asynchronous work.
    pub fn is_open(&self) -> bool {
        self.state.lock().engine.is_some()
    }

    /// The dimensionality of the open index.
    pub fn dimension(&self) -> SidxResult<u32> {
        let mut state = self.state.lock();
        Ok(state.engine_mut()?.dimension())
    }

    /// Creates the engine handle if it does not exist yet.
    ///
    /// A pending configuration is consumed on success; when none is pending
    /// a default in-memory R*-tree is created. On failure the configuration
    /// is retained so the resource stays in its prior state and the caller
    /// may retry or tear down cleanly.
    pub fn ensure_open(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if state.engine.is_some() {
            return Ok(());
        }
        let config = state.config.take().unwrap_or_default();
        match engine::open_engine(&config) {
            Ok(handle) => {
                log::debug!("opened spatial index handle: {:?}", config);
                state.engine = Some(handle);
                Ok(())
            }
            Err(err) => {
                state.config = Some(config);
                Err(err)
            }
        }
    }

    /// Locks the resource for the duration of one task's execute phase.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock()
    }
}
