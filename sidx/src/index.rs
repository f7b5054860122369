//! The caller-facing spatial index wrapper.
//!
//! A `SpatialIndex` owns one [`IndexResource`] for its whole lifetime and
//! submits every long-running operation to a [`Dispatcher`]; the calling
//! thread never blocks on index I/O. Results arrive through completion
//! callbacks. Precondition failures (`NotOpen`, malformed windows) are
//! returned synchronously and the operation is never enqueued.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::build_config;
use crate::dispatcher::Dispatcher;
use crate::errors::{SidxError, SidxResult};
use crate::marshal::{copy_coords, window_dims, Payload};
use crate::resource::IndexResource;
use crate::task::{BoundsResult, Operation, Outcome, QueryEntry, Task};

/// An asynchronous R-Tree spatial index.
///
/// Cheap to clone; all clones share the same underlying handle.
///
/// # Examples
///
/// ```rust,no_run
/// use sidx::SpatialIndex;
///
/// let index = SpatialIndex::new(None);
/// index.open(|result| {
///     if let Err(e) = result {
///         eprintln!("{}", e);
///     }
/// });
/// ```
#[derive(Clone)]
pub struct SpatialIndex {
    inner: Arc<SpatialIndexInner>,
}

struct SpatialIndexInner {
    resource: Arc<IndexResource>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").finish_non_exhaustive()
    }
}

impl SpatialIndex {
    /// Creates an index wrapper from an optional configuration mapping,
    /// using the process-wide dispatcher. An absent or empty mapping means
    /// "default in-memory R*-tree on open".
    pub fn new(params: Option<&HashMap<String, String>>) -> Self {
        Self::with_dispatcher(params, Dispatcher::global().clone())
    }

    /// Creates an index wrapper that submits its work to the given
    /// dispatcher instead of the process-wide one.
    pub fn with_dispatcher(
        params: Option<&HashMap<String, String>>,
        dispatcher: Dispatcher,
    ) -> Self {
        SpatialIndex {
            inner: Arc::new(SpatialIndexInner {
                resource: Arc::new(IndexResource::new(build_config(params))),
                dispatcher,
            }),
        }
    }

    /// Opens the index, consuming the pending configuration. A no-op when
    /// the index is already open.
    pub fn open(&self, callback: impl FnOnce(SidxResult<()>) + Send + 'static) {
        self.submit(Operation::Open, move |result| callback(result.map(|_| ())));
    }

    /// Reports the engine's version string.
    pub fn version(&self, callback: impl FnOnce(SidxResult<String>) + Send + 'static) {
        self.submit(Operation::Version, move |result| {
            callback(result.and_then(|outcome| match outcome {
                Outcome::Version(v) => Ok(v),
                other => Err(unexpected_outcome(&other)),
            }))
        });
    }

    /// The dimensionality of the open index. Synchronous; fails with
    /// `NotOpen` before the index has been opened.
    pub fn dimension(&self) -> SidxResult<u32> {
        self.inner.resource.dimension()
    }

    /// Inserts an entry. The payload bytes are copied before this call
    /// returns, so the borrow does not outlive the caller's scope.
    pub fn insert(
        &self,
        id: i64,
        mins: &[f64],
        maxs: &[f64],
        payload: Option<&[u8]>,
        callback: impl FnOnce(SidxResult<()>) + Send + 'static,
    ) -> SidxResult<()> {
        self.require_open()?;
        window_dims(mins, maxs)?;
        self.submit(
            Operation::Insert {
                id,
                mins: copy_coords(mins),
                maxs: copy_coords(maxs),
                payload: payload.map(Payload::copy_from),
            },
            move |result| callback(result.map(|_| ())),
        );
        Ok(())
    }

    /// Removes the entry matching `id` and the exact MBR.
    pub fn delete(
        &self,
        id: i64,
        mins: &[f64],
        maxs: &[f64],
        callback: impl FnOnce(SidxResult<()>) + Send + 'static,
    ) -> SidxResult<()> {
        self.require_open()?;
        window_dims(mins, maxs)?;
        self.submit(
            Operation::Delete {
                id,
                mins: copy_coords(mins),
                maxs: copy_coords(maxs),
            },
            move |result| callback(result.map(|_| ())),
        );
        Ok(())
    }

    /// Runs an intersection query over the full result set.
    pub fn intersects(
        &self,
        mins: &[f64],
        maxs: &[f64],
        callback: impl FnOnce(SidxResult<Vec<QueryEntry>>) + Send + 'static,
    ) -> SidxResult<()> {
        self.intersects_paged(mins, maxs, 0, 0, callback)
    }

    /// Runs an intersection query returning at most `length` entries
    /// starting at `offset`. Zero means "no restriction" for either value.
    /// The handle's paging state is restored once the query completes.
    pub fn intersects_paged(
        &self,
        mins: &[f64],
        maxs: &[f64],
        offset: u64,
        length: u64,
        callback: impl FnOnce(SidxResult<Vec<QueryEntry>>) + Send + 'static,
    ) -> SidxResult<()> {
        self.require_open()?;
        window_dims(mins, maxs)?;
        self.submit(
            Operation::Intersects {
                mins: copy_coords(mins),
                maxs: copy_coords(maxs),
                offset,
                length,
            },
            move |result| {
                callback(result.and_then(|outcome| match outcome {
                    Outcome::Matches(entries) => Ok(entries),
                    other => Err(unexpected_outcome(&other)),
                }))
            },
        );
        Ok(())
    }

    /// Reports the overall extent of all stored entries.
    pub fn bounds(
        &self,
        callback: impl FnOnce(SidxResult<BoundsResult>) + Send + 'static,
    ) -> SidxResult<()> {
        self.require_open()?;
        self.submit(Operation::Bounds, move |result| {
            callback(result.and_then(|outcome| match outcome {
                Outcome::Bounds(bounds) => Ok(bounds),
                other => Err(unexpected_outcome(&other)),
            }))
        });
        Ok(())
    }

    fn require_open(&self) -> SidxResult<()> {
        if self.inner.resource.is_open() {
            Ok(())
        } else {
            Err(SidxError::NotOpen)
        }
    }

    fn submit(&self, op: Operation, callback: impl FnOnce(SidxResult<Outcome>) + Send + 'static) {
        self.inner.dispatcher.submit(
            Task::new(Arc::clone(&self.inner.resource), op),
            Box::new(callback),
        );
    }
}

fn unexpected_outcome(outcome: &Outcome) -> SidxError {
    SidxError::Engine(format!("unexpected task outcome: {:?}", outcome))
}
