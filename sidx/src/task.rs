//! Asynchronous operations as one parametrized task.
//!
//! Every caller-facing operation is a variant of [`Operation`]; a [`Task`]
//! pairs one variant with the resource it targets. Inputs are captured by
//! value on the caller's thread at construction time, the blocking engine
//! call happens in [`Task::execute`] on a worker thread, and the outcome is
//! translated back into caller-visible values by the completion callback.

use std::sync::Arc;

use crate::engine::{self, EngineItem};
use crate::errors::{SidxError, SidxResult};
use crate::marshal::Payload;
use crate::resource::IndexResource;

const OPEN_PREFIX: &str = "Error opening Index: ";
const INSERT_PREFIX: &str = "Error inserting data: ";
const DELETE_PREFIX: &str = "Error deleting data: ";
const INTERSECTS_PREFIX: &str = "Error performing Intersects: ";
const BOUNDS_PREFIX: &str = "Error getting bounds: ";

/// The closed set of operations the dispatcher executes.
#[derive(Debug)]
pub(crate) enum Operation {
    Open,
    Version,
    Insert {
        id: i64,
        mins: Vec<f64>,
        maxs: Vec<f64>,
        payload: Option<Payload>,
    },
    Delete {
        id: i64,
        mins: Vec<f64>,
        maxs: Vec<f64>,
    },
    Intersects {
        mins: Vec<f64>,
        maxs: Vec<f64>,
        offset: u64,
        length: u64,
    },
    Bounds,
}

/// One (id, payload) pair matching a range query. The payload bytes were
/// transferred out of the engine; the caller now owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    pub id: i64,
    pub data: Option<Vec<u8>>,
}

impl From<EngineItem> for QueryEntry {
    fn from(item: EngineItem) -> Self {
        QueryEntry {
            id: item.id,
            data: item.payload.map(Payload::into_bytes),
        }
    }
}

/// The overall extent of all stored entries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsResult {
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
    pub dimension: u32,
}

/// The successful result of any operation variant.
#[derive(Debug)]
pub(crate) enum Outcome {
    Done,
    Version(String),
    Matches(Vec<QueryEntry>),
    Bounds(BoundsResult),
}

/// A unit of asynchronous work: one operation against one resource.
pub(crate) struct Task {
    resource: Arc<IndexResource>,
    op: Operation,
}

impl Task {
    pub(crate) fn new(resource: Arc<IndexResource>, op: Operation) -> Self {
        Task { resource, op }
    }

    /// Runs the blocking engine call. Executed on a worker thread; the
    /// resource lock is held for the whole call, which serializes tasks
    /// targeting the same handle.
    pub(crate) fn execute(self) -> SidxResult<Outcome> {
        match self.op {
            Operation::Open => self
                .resource
                .ensure_open()
                .map(|_| Outcome::Done)
                .map_err(|e| SidxError::engine(OPEN_PREFIX, e)),

            Operation::Version => Ok(Outcome::Version(engine::version())),

            Operation::Insert {
                id,
                mins,
                maxs,
                payload,
            } => {
                let mut state = self.resource.lock();
                state
                    .engine_mut()?
                    .insert(id, &mins, &maxs, payload)
                    .map(|_| Outcome::Done)
                    .map_err(|e| SidxError::engine(INSERT_PREFIX, e))
            }

            Operation::Delete { id, mins, maxs } => {
                let mut state = self.resource.lock();
                state
                    .engine_mut()?
                    .delete(id, &mins, &maxs)
                    .map(|_| Outcome::Done)
                    .map_err(|e| SidxError::engine(DELETE_PREFIX, e))
            }

            Operation::Intersects {
                mins,
                maxs,
                offset,
                length,
            } => {
                let mut state = self.resource.lock();
                let engine = state.engine_mut()?;

                // Save/modify/query/restore on the handle-global paging
                // state. The resource lock is held throughout, so no other
                // operation can observe the overridden values, and the
                // restore runs on the failure path as well.
                let saved_limit = engine.result_set_limit();
                let saved_offset = engine.result_set_offset();
                if length > 0 {
                    engine.set_result_set_limit(length);
                }
                if offset > 0 {
                    engine.set_result_set_offset(offset);
                }
                let result = engine.intersects(&mins, &maxs);
                engine.set_result_set_limit(saved_limit);
                engine.set_result_set_offset(saved_offset);

                let items = result.map_err(|e| SidxError::engine(INTERSECTS_PREFIX, e))?;
                Ok(Outcome::Matches(
                    items.into_iter().map(QueryEntry::from).collect(),
                ))
            }

            Operation::Bounds => {
                let mut state = self.resource.lock();
                let bounds = state
                    .engine_mut()?
                    .bounds()
                    .map_err(|e| SidxError::engine(BOUNDS_PREFIX, e))?;
                Ok(Outcome::Bounds(BoundsResult {
                    mins: bounds.mins,
                    maxs: bounds.maxs,
                    dimension: bounds.dimension,
                }))
            }
        }
    }
}
