//! Marshaling helpers for the synchronous/asynchronous boundary.
//!
//! Coordinate slices and payload bytes supplied by the caller are snapshotted
//! while still on the caller's thread, so the spawned task owns every input
//! it needs for the duration of the engine call.

use crate::errors::{SidxError, SidxResult};

/// An opaque binary payload whose ownership moves with the value.
///
/// Callers hand payload bytes to the index on insert; the engine hands them
/// back inside query results. Each crossing copies the bytes exactly once,
/// so neither side ever frees memory it does not own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Copies the caller's bytes into an owned payload.
    pub fn copy_from(bytes: &[u8]) -> Self {
        Payload(bytes.to_vec())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Transfers the bytes out, consuming the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes)
    }
}

/// Snapshots a caller-supplied coordinate sequence.
pub(crate) fn copy_coords(values: &[f64]) -> Vec<f64> {
    values.to_vec()
}

/// Validates a query/entry window and returns its dimensionality.
///
/// The dimensionality is derived from `mins` at call time; `maxs` must match
/// it. Whether it also matches the index's configured dimensionality is the
/// engine's concern and is reported as an engine failure at execute time.
pub(crate) fn window_dims(mins: &[f64], maxs: &[f64]) -> SidxResult<u32> {
    if mins.len() != maxs.len() {
        return Err(SidxError::InvalidInput(
            "min and max MBR arrays must have the same length".to_string(),
        ));
    }
    Ok(mins.len() as u32)
}
