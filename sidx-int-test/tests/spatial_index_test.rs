// End-to-end lifecycle tests: configure, open, insert, query, page, delete.

use sidx::errors::SidxError;
use sidx::SpatialIndex;
use sidx_int_test::test_util::{await_callback, open_index};

#[ctor::ctor]
fn init() {
    colog::init();
}

const MINS: [f64; 2] = [0.0, 1.0];
const MAXS: [f64; 2] = [0.0, 1.0];
const POINT: &[u8] = b"POINT(0 1)";

#[test]
fn test_options_constructor() {
    let index = open_index(&[
        ("type", "rtree"),
        ("storage", "memory"),
        ("dimension", "3"),
    ])
    .unwrap();
    assert_eq!(index.dimension().unwrap(), 3);
}

#[test]
fn test_version_string() {
    let index = open_index(&[]).unwrap();
    let version = await_callback(move |tx| {
        index.version(move |result| {
            let _ = tx.send(result);
        })
    })
    .unwrap();
    assert!(version.starts_with("sidx "));
    assert!(!version.trim().is_empty());
}

#[test]
fn test_insert_and_retrieve_data() {
    let index = open_index(&[]).unwrap();

    let idx = index.clone();
    await_callback(move |tx| {
        idx.insert(1, &MINS, &MAXS, Some(POINT), move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();

    let entries = await_callback(move |tx| {
        index
            .intersects(&MINS, &MAXS, move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].data.as_deref(), Some(POINT));
}

#[test]
fn test_bounds() {
    let index = open_index(&[]).unwrap();

    let idx = index.clone();
    await_callback(move |tx| {
        idx.insert(1, &MINS, &MAXS, Some(POINT), move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();

    let bounds = await_callback(move |tx| {
        index
            .bounds(move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();

    assert_eq!(bounds.dimension, 2);
    assert_eq!(bounds.mins, MINS.to_vec());
    assert_eq!(bounds.maxs, MAXS.to_vec());
}

#[test]
fn test_delete_data() {
    let index = open_index(&[]).unwrap();

    let idx = index.clone();
    await_callback(move |tx| {
        idx.insert(1, &MINS, &MAXS, Some(POINT), move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();

    await_callback(move |tx| {
        index
            .delete(1, &MINS, &MAXS, move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();
}

#[test]
fn test_offset_and_limit_data() {
    let index = open_index(&[]).unwrap();

    for i in 0..10 {
        let coord = i as f64;
        let payload = format!("POINT({} {})", i, i);
        let idx = index.clone();
        await_callback(move |tx| {
            idx.insert(
                i,
                &[coord, coord],
                &[coord, coord],
                Some(payload.as_bytes()),
                move |result| {
                    let _ = tx.send(result);
                },
            )
            .unwrap()
        })
        .unwrap();
    }

    let idx = index.clone();
    let paged = await_callback(move |tx| {
        idx.intersects_paged(&[0.0, 0.0], &[10.0, 10.0], 4, 7, move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();
    assert_eq!(paged.len(), 6);
    assert_eq!(paged[0].id, 4);
    assert_eq!(paged[0].data.as_deref(), Some(b"POINT(4 4)".as_slice()));

    // The paging override is scoped to the call above; an unrestricted
    // query afterwards sees the full result set.
    let all = await_callback(move |tx| {
        index
            .intersects(&[0.0, 0.0], &[10.0, 10.0], move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();
    assert_eq!(all.len(), 10);
}

#[test]
fn test_operations_before_open_fail_synchronously() {
    let index = SpatialIndex::new(None);
    assert_eq!(index.dimension(), Err(SidxError::NotOpen));
    assert_eq!(
        index.insert(1, &MINS, &MAXS, None, |_| {}),
        Err(SidxError::NotOpen)
    );
    assert_eq!(index.delete(1, &MINS, &MAXS, |_| {}), Err(SidxError::NotOpen));
    assert_eq!(
        index.intersects(&MINS, &MAXS, |_| {}),
        Err(SidxError::NotOpen)
    );
    assert_eq!(index.bounds(|_| {}), Err(SidxError::NotOpen));
}

#[test]
fn test_insert_query_delete_scenario() {
    let index = open_index(&[]).unwrap();

    let idx = index.clone();
    await_callback(move |tx| {
        idx.insert(1, &[0.0, 0.0], &[1.0, 1.0], Some(&[0xAB]), move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();

    let idx = index.clone();
    let entries = await_callback(move |tx| {
        idx.intersects(&[0.0, 0.0], &[2.0, 2.0], move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].data.as_deref(), Some(&[0xAB][..]));

    let idx = index.clone();
    await_callback(move |tx| {
        idx.delete(1, &[0.0, 0.0], &[1.0, 1.0], move |result| {
            let _ = tx.send(result);
        })
        .unwrap()
    })
    .unwrap();

    let entries = await_callback(move |tx| {
        index
            .intersects(&[0.0, 0.0], &[2.0, 2.0], move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_bounds_in_three_dimensions() {
    let index = open_index(&[("dimension", "3")]).unwrap();

    let idx = index.clone();
    await_callback(move |tx| {
        idx.insert(
            1,
            &[0.0, 1.0, 2.0],
            &[3.0, 4.0, 5.0],
            None,
            move |result| {
                let _ = tx.send(result);
            },
        )
        .unwrap()
    })
    .unwrap();

    let bounds = await_callback(move |tx| {
        index
            .bounds(move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    })
    .unwrap();
    assert_eq!(bounds.dimension, 3);
    assert_eq!(bounds.mins, vec![0.0, 1.0, 2.0]);
    assert_eq!(bounds.maxs, vec![3.0, 4.0, 5.0]);
}

#[test]
fn test_dimension_mismatch_surfaces_as_engine_failure() {
    let index = open_index(&[]).unwrap();
    let result = await_callback(move |tx| {
        index
            .insert(1, &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], None, move |result| {
                let _ = tx.send(result);
            })
            .unwrap()
    });
    match result {
        Err(SidxError::Engine(msg)) => {
            assert!(msg.starts_with("Error inserting data: "))
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
