//! Shared helpers for the integration tests.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use sidx::errors::SidxResult;
use sidx::SpatialIndex;

/// How long a single callback may take before a test gives up.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs one asynchronous index call and blocks the test thread until its
/// callback fires.
///
/// The closure receives a channel sender to move into the callback:
///
/// ```rust,ignore
/// let entries = await_callback(|tx| {
///     index.intersects(&mins, &maxs, move |res| { let _ = tx.send(res); }).unwrap()
/// })?;
/// ```
pub fn await_callback<T, F>(submit: F) -> SidxResult<T>
where
    T: Send + 'static,
    F: FnOnce(crossbeam_channel::Sender<SidxResult<T>>),
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    submit(tx);
    rx.recv_timeout(CALLBACK_TIMEOUT)
        .expect("callback did not fire in time")
}

/// Creates an index from the given configuration pairs and opens it.
pub fn open_index(params: &[(&str, &str)]) -> SidxResult<SpatialIndex> {
    let map: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let index = if map.is_empty() {
        SpatialIndex::new(None)
    } else {
        SpatialIndex::new(Some(&map))
    };
    let opened = index.clone();
    await_callback(move |tx| {
        opened.open(move |result| {
            let _ = tx.send(result);
        })
    })?;
    Ok(index)
}

/// A unique path under the system temp directory, for disk-backed indexes.
pub fn random_index_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir()
        .join(format!("sidx_{}.idx", id))
        .to_str()
        .expect("temp path is valid utf-8")
        .to_string()
}
