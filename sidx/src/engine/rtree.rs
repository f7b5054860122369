//! Default spatial engine backed by `rstar`.
//!
//! Entries are kept in an in-memory R-tree; disk-backed indexes load a
//! bincode snapshot at open and write it back on flush (and on drop). The
//! result-set offset/limit is handle-global state, applied to every
//! intersection query until changed, matching the handle API this engine
//! stands in for.

use std::fs;
use std::path::PathBuf;

use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::config::{IndexConfig, SplitVariant, StorageKind};
use crate::engine::{EngineBounds, EngineError, EngineItem, EngineResult, SpatialEngine};
use crate::marshal::Payload;

/// One stored entry. Equality is id + exact MBR; the payload does not
/// participate, so a delete probe never needs the original bytes.
#[derive(Debug, Clone)]
struct StoredEntry<const N: usize> {
    id: i64,
    mins: [f64; N],
    maxs: [f64; N],
    payload: Option<Vec<u8>>,
}

impl<const N: usize> PartialEq for StoredEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.mins == other.mins && self.maxs == other.maxs
    }
}

impl<const N: usize> RTreeObject for StoredEntry<N>
where
    [f64; N]: rstar::Point,
{
    type Envelope = AABB<[f64; N]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.mins, self.maxs)
    }
}

fn entry_from_parts<const N: usize>(
    id: i64,
    mins: &[f64],
    maxs: &[f64],
    payload: Option<Vec<u8>>,
) -> EngineResult<StoredEntry<N>> {
    let mins: [f64; N] = mins
        .try_into()
        .map_err(|_| dimension_mismatch(N as u32, mins.len()))?;
    let maxs: [f64; N] = maxs
        .try_into()
        .map_err(|_| dimension_mismatch(N as u32, maxs.len()))?;
    Ok(StoredEntry {
        id,
        mins,
        maxs,
        payload,
    })
}

fn dimension_mismatch(expected: u32, got: usize) -> EngineError {
    EngineError::InvalidOperation(format!(
        "mismatched dimensions: index has {}, arrays have {}",
        expected, got
    ))
}

fn intersecting<const N: usize>(
    tree: &RTree<StoredEntry<N>>,
    mins: &[f64],
    maxs: &[f64],
) -> EngineResult<Vec<EngineItem>>
where
    [f64; N]: rstar::Point,
{
    let probe: StoredEntry<N> = entry_from_parts(0, mins, maxs, None)?;
    let window = probe.envelope();
    let mut items: Vec<EngineItem> = tree
        .locate_in_envelope_intersecting(&window)
        .map(|entry| EngineItem {
            id: entry.id,
            payload: entry.payload.clone().map(Payload::from),
        })
        .collect();
    // Tree traversal order is arbitrary; ascending id keeps paging stable.
    items.sort_by_key(|item| item.id);
    Ok(items)
}

fn fold_bounds<const N: usize>(tree: &RTree<StoredEntry<N>>) -> Option<(Vec<f64>, Vec<f64>)>
where
    [f64; N]: rstar::Point,
{
    let mut entries = tree.iter();
    let first = entries.next()?;
    let mut mins = first.mins.to_vec();
    let mut maxs = first.maxs.to_vec();
    for entry in entries {
        for dim in 0..N {
            mins[dim] = mins[dim].min(entry.mins[dim]);
            maxs[dim] = maxs[dim].max(entry.maxs[dim]);
        }
    }
    Some((mins, maxs))
}

/// The snapshot written for disk-backed indexes. Coordinates are stored as
/// plain vectors so the on-disk shape is independent of the compile-time
/// dimensionality.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    dimension: u32,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    id: i64,
    mins: Vec<f64>,
    maxs: Vec<f64>,
    payload: Option<Vec<u8>>,
}

#[derive(Debug)]
enum TreeStore {
    D2(RTree<StoredEntry<2>>),
    D3(RTree<StoredEntry<3>>),
}

impl TreeStore {
    fn empty(dimension: u32) -> EngineResult<TreeStore> {
        match dimension {
            2 => Ok(TreeStore::D2(RTree::new())),
            3 => Ok(TreeStore::D3(RTree::new())),
            other => Err(EngineError::InvalidOperation(format!(
                "unsupported dimension: {}",
                other
            ))),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> EngineResult<(u32, TreeStore)> {
        fn collect<const N: usize>(
            entries: Vec<SnapshotEntry>,
        ) -> EngineResult<Vec<StoredEntry<N>>> {
            entries
                .into_iter()
                .map(|e| entry_from_parts(e.id, &e.mins, &e.maxs, e.payload))
                .collect()
        }

        let store = match snapshot.dimension {
            2 => TreeStore::D2(RTree::bulk_load(collect::<2>(snapshot.entries)?)),
            3 => TreeStore::D3(RTree::bulk_load(collect::<3>(snapshot.entries)?)),
            other => {
                return Err(EngineError::Serialization(format!(
                    "snapshot has unsupported dimension: {}",
                    other
                )))
            }
        };
        Ok((snapshot.dimension, store))
    }

    fn to_snapshot(&self, dimension: u32) -> Snapshot {
        fn collect<const N: usize>(tree: &RTree<StoredEntry<N>>) -> Vec<SnapshotEntry>
        where
            [f64; N]: rstar::Point,
        {
            tree.iter()
                .map(|entry| SnapshotEntry {
                    id: entry.id,
                    mins: entry.mins.to_vec(),
                    maxs: entry.maxs.to_vec(),
                    payload: entry.payload.clone(),
                })
                .collect()
        }

        let entries = match self {
            TreeStore::D2(tree) => collect(tree),
            TreeStore::D3(tree) => collect(tree),
        };
        Snapshot { dimension, entries }
    }
}

/// An rstar-backed engine handle. One instance per open index.
#[derive(Debug)]
pub struct RTreeEngine {
    dimension: u32,
    variant: SplitVariant,
    storage: StorageKind,
    path: Option<PathBuf>,
    offset: u64,
    limit: u64,
    dirty: bool,
    store: TreeStore,
}

impl RTreeEngine {
    /// Opens an engine from a property set. Disk-backed indexes reload
    /// their snapshot; an existing snapshot's dimensionality wins over the
    /// configured one, the way reopening a stored index adopts its stored
    /// properties.
    pub fn open(config: &IndexConfig) -> EngineResult<RTreeEngine> {
        let (dimension, store, path) = match config.storage {
            StorageKind::Memory => {
                (config.dimension, TreeStore::empty(config.dimension)?, None)
            }
            StorageKind::Disk => {
                let path = config.filename.clone().ok_or_else(|| {
                    EngineError::InvalidOperation(
                        "disk storage requires a file name".to_string(),
                    )
                })?;
                if path.exists() {
                    log::debug!("loading spatial index snapshot from {:?}", path);
                    let bytes = fs::read(&path)?;
                    let (snapshot, _): (Snapshot, usize) =
                        bincode::serde::decode_from_slice(&bytes, bincode::config::legacy())
                            .map_err(|e| EngineError::Serialization(e.to_string()))?;
                    let (dimension, store) = TreeStore::from_snapshot(snapshot)?;
                    (dimension, store, Some(path))
                } else {
                    log::debug!("creating spatial index snapshot at {:?}", path);
                    (config.dimension, TreeStore::empty(config.dimension)?, Some(path))
                }
            }
        };

        Ok(RTreeEngine {
            dimension,
            variant: config.variant,
            storage: config.storage,
            path,
            offset: 0,
            limit: 0,
            dirty: false,
            store,
        })
    }

    /// The split heuristic the index was configured with. The rstar backend
    /// always splits R*-style regardless; the setting is retained so the
    /// handle reports the properties it was created from.
    pub fn variant(&self) -> SplitVariant {
        self.variant
    }

    fn check_dims(&self, mins: &[f64], maxs: &[f64]) -> EngineResult<()> {
        if mins.len() as u32 != self.dimension {
            return Err(dimension_mismatch(self.dimension, mins.len()));
        }
        if maxs.len() as u32 != self.dimension {
            return Err(dimension_mismatch(self.dimension, maxs.len()));
        }
        Ok(())
    }

    fn page(&self, items: Vec<EngineItem>) -> Vec<EngineItem> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = if self.limit == 0 {
            usize::MAX
        } else {
            usize::try_from(self.limit).unwrap_or(usize::MAX)
        };
        items.into_iter().skip(skip).take(take).collect()
    }
}

impl SpatialEngine for RTreeEngine {
    fn dimension(&self) -> u32 {
        self.dimension
    }

    fn insert(
        &mut self,
        id: i64,
        mins: &[f64],
        maxs: &[f64],
        payload: Option<Payload>,
    ) -> EngineResult<()> {
        self.check_dims(mins, maxs)?;
        let payload = payload.map(Payload::into_bytes);
        match &mut self.store {
            TreeStore::D2(tree) => tree.insert(entry_from_parts(id, mins, maxs, payload)?),
            TreeStore::D3(tree) => tree.insert(entry_from_parts(id, mins, maxs, payload)?),
        }
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, id: i64, mins: &[f64], maxs: &[f64]) -> EngineResult<()> {
        self.check_dims(mins, maxs)?;
        let removed = match &mut self.store {
            TreeStore::D2(tree) => tree.remove(&entry_from_parts(id, mins, maxs, None)?).is_some(),
            TreeStore::D3(tree) => tree.remove(&entry_from_parts(id, mins, maxs, None)?).is_some(),
        };
        if !removed {
            return Err(EngineError::InvalidOperation(format!(
                "no entry with id {} and matching bounds",
                id
            )));
        }
        self.dirty = true;
        Ok(())
    }

    fn intersects(&self, mins: &[f64], maxs: &[f64]) -> EngineResult<Vec<EngineItem>> {
        self.check_dims(mins, maxs)?;
        let items = match &self.store {
            TreeStore::D2(tree) => intersecting(tree, mins, maxs)?,
            TreeStore::D3(tree) => intersecting(tree, mins, maxs)?,
        };
        Ok(self.page(items))
    }

    fn bounds(&self) -> EngineResult<EngineBounds> {
        let folded = match &self.store {
            TreeStore::D2(tree) => fold_bounds(tree),
            TreeStore::D3(tree) => fold_bounds(tree),
        };
        match folded {
            Some((mins, maxs)) => Ok(EngineBounds {
                mins,
                maxs,
                dimension: self.dimension,
            }),
            None => Err(EngineError::InvalidOperation(
                "bounds are undefined for an empty index".to_string(),
            )),
        }
    }

    fn result_set_offset(&self) -> u64 {
        self.offset
    }

    fn set_result_set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    fn result_set_limit(&self) -> u64 {
        self.limit
    }

    fn set_result_set_limit(&mut self, limit: u64) {
        self.limit = limit;
    }

    fn flush(&mut self) -> EngineResult<()> {
        if self.storage != StorageKind::Disk || !self.dirty {
            return Ok(());
        }
        let path = self.path.as_ref().ok_or_else(|| {
            EngineError::InvalidOperation("disk storage requires a file name".to_string())
        })?;
        let snapshot = self.store.to_snapshot(self.dimension);
        let bytes = bincode::serde::encode_to_vec(&snapshot, bincode::config::legacy())
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        fs::write(path, bytes)?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for RTreeEngine {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("failed to flush spatial index snapshot: {}", e);
        }
    }
}
