//! # Sidx - Asynchronous Spatial Indexing
//!
//! This crate provides asynchronous, callback-driven access to a mutable
//! R-Tree spatial index storing multi-dimensional bounding boxes, each
//! associated with a 64-bit identifier and an optional binary payload.
//!
//! ## Features
//!
//! - **Non-Blocking**: Every index operation runs on a worker pool; the
//!   calling thread returns immediately and receives the result through a
//!   completion callback
//! - **In-Memory or Disk-Backed**: Storage kind, split variant, and
//!   dimensionality (2D/3D) selected through a key/value configuration
//! - **Payload Round-Trip**: Opaque payload bytes move into the index on
//!   insert and back out of query results, copied once per crossing
//! - **Paged Queries**: Intersection queries accept an offset/length window
//!   with the handle's paging state restored afterwards
//! - **Serialized Handles**: Operations against one index never overlap;
//!   operations against distinct indexes run in parallel
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sidx::SpatialIndex;
//!
//! let index = SpatialIndex::new(None);
//! index.open(|result| {
//!     assert!(result.is_ok());
//! });
//! // ... once the open callback has fired:
//! index.insert(1, &[0.0, 0.0], &[1.0, 1.0], Some(b"POINT(0 0)"), |result| {
//!     assert!(result.is_ok());
//! }).ok();
//! index.intersects(&[0.0, 0.0], &[2.0, 2.0], |result| {
//!     let entries = result.unwrap();
//!     assert_eq!(entries[0].id, 1);
//! }).ok();
//! ```
//!
//! ## Engine Boundary
//!
//! The dispatcher core is engine-agnostic: it drives any
//! [`engine::SpatialEngine`] implementation. The bundled engine keeps
//! entries in an `rstar` R-tree and persists disk-backed indexes as a
//! bincode snapshot.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod index;
pub mod marshal;
pub mod resource;

mod task;

pub use config::{IndexConfig, IndexType, SplitVariant, StorageKind};
pub use dispatcher::Dispatcher;
pub use errors::{SidxError, SidxResult};
pub use index::SpatialIndex;
pub use marshal::Payload;
pub use resource::IndexResource;
pub use task::{BoundsResult, QueryEntry};

/// The engine's version string.
pub fn version() -> String {
    engine::version()
}
