use fogmap::{AppendLogStore, CacheBuilder, GeoPoint, PersistentStore};
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_append_log_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("visited.log");

    {
        let store = AppendLogStore::open(&path).unwrap();
        store
            .insert_batch(&[GeoPoint::new(10.0, 20.0), GeoPoint::new(30.0, 40.0)])
            .unwrap();
        store
            .insert_batch(&[GeoPoint::with_accuracy(5.0, 5.0, 12.0)])
            .unwrap();
        assert_eq!(store.stats().batches_written, 2);
        assert!(store.size() > 0);
    }

    let store = AppendLogStore::open(&path).unwrap();
    let points = store.load_all().unwrap();
    assert_eq!(
        points,
        vec![
            GeoPoint::new(10.0, 20.0),
            GeoPoint::new(30.0, 40.0),
            GeoPoint::with_accuracy(5.0, 5.0, 12.0),
        ]
    );
    assert_eq!(store.stats().point_count, 3);
    assert_eq!(store.stats().loads, 1);
}

#[test]
fn test_append_log_ignores_torn_tail() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("visited.log");

    {
        let store = AppendLogStore::open(&path).unwrap();
        store.insert_batch(&[GeoPoint::new(1.0, 2.0)]).unwrap();
    }

    // A frame header promising more bytes than were written before a crash.
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0, 0, 0, 64, 1, 2, 3]).unwrap();
    drop(file);

    let store = AppendLogStore::open(&path).unwrap();
    assert_eq!(store.load_all().unwrap(), vec![GeoPoint::new(1.0, 2.0)]);
}

#[test]
fn test_append_log_rejects_corrupt_frame() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("visited.log");
    std::fs::write(&path, [0, 0, 0, 3, 0xff, 0xff, 0xff]).unwrap();

    let store = AppendLogStore::open(&path).unwrap();
    assert!(matches!(
        store.load_all(),
        Err(fogmap::FogmapError::StorageUnavailable(_))
    ));
}

#[test]
fn test_append_log_delete_all() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("visited.log");

    let store = AppendLogStore::open(&path).unwrap();
    store.insert_batch(&[GeoPoint::new(1.0, 2.0)]).unwrap();
    store.delete_all().unwrap();
    assert_eq!(store.size(), 0);
    assert!(store.load_all().unwrap().is_empty());

    store.insert_batch(&[GeoPoint::new(3.0, 4.0)]).unwrap();
    assert_eq!(store.load_all().unwrap(), vec![GeoPoint::new(3.0, 4.0)]);
}

#[test]
fn test_cache_over_append_log() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("visited.log");

    let cache = CacheBuilder::new()
        .append_log_path(&path)
        .auto_flush(false)
        .build()
        .unwrap();
    cache.insert(GeoPoint::new(46.77, 23.59)).unwrap();
    cache.insert(GeoPoint::new(46.77, 23.59)).unwrap();
    cache.insert(GeoPoint::new(46.78, 23.60)).unwrap();
    assert_eq!(cache.flush_if_dirty().unwrap(), 2);
    cache.insert(GeoPoint::new(46.79, 23.61)).unwrap();
    cache.destroy().unwrap();

    let reopened = CacheBuilder::new()
        .append_log_path(&path)
        .auto_flush(false)
        .build()
        .unwrap();
    assert_eq!(reopened.select_all().unwrap().len(), 3);
    assert_eq!(reopened.store().stats().batches_written, 0);
}
