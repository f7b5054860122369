// Disk-backed indexes reload their contents across wrapper lifetimes.

use std::fs;

use sidx::errors::SidxError;
use sidx_int_test::test_util::{await_callback, open_index, random_index_path};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_disk_index_survives_reopen() {
    let path = random_index_path();

    {
        let index = open_index(&[("storage", "disk"), ("filename", &path)]).unwrap();
        let idx = index.clone();
        await_callback(move |tx| {
            idx.insert(7, &[1.0, 2.0], &[3.0, 4.0], Some(b"persisted"), move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
        })
        .unwrap();
        // Dropping the last wrapper clone releases the handle, which
        // flushes the snapshot.
    }

    let index = open_index(&[("storage", "disk"), ("filename", &path)]).unwrap();
    let entries = await_callback(move |tx| {
        index
            .intersects(&[0.0, 0.0], &[5.0, 5.0], move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 7);
    assert_eq!(entries[0].data.as_deref(), Some(b"persisted".as_slice()));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_disk_storage_without_filename_fails_to_open() {
    let result = open_index(&[("storage", "disk")]);
    match result {
        Err(SidxError::Engine(msg)) => {
            assert!(msg.starts_with("Error opening Index: "));
            assert!(msg.contains("file name"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_reopened_index_keeps_stored_dimension() {
    let path = random_index_path();

    {
        let index = open_index(&[
            ("storage", "disk"),
            ("filename", &path),
            ("dimension", "3"),
        ])
        .unwrap();
        let idx = index.clone();
        await_callback(move |tx| {
            idx.insert(1, &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], None, move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
        })
        .unwrap();
    }

    // No dimension in the reopen configuration; the stored properties win.
    let index = open_index(&[("storage", "disk"), ("filename", &path)]).unwrap();
    assert_eq!(index.dimension().unwrap(), 3);

    let _ = fs::remove_file(&path);
}
