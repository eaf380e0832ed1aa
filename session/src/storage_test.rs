use super::*;

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert!(storage.get("k").is_none());
    storage.set("k", "v");
    assert_eq!(storage.get("k").as_deref(), Some("v"));
    storage.remove("k");
    assert!(storage.get("k").is_none());
    assert!(storage.is_empty());
}

#[test]
fn memory_storage_clones_share_entries() {
    let a = MemoryStorage::new();
    let b = a.clone();
    a.set("shared", "1");
    assert_eq!(b.get("shared").as_deref(), Some("1"));
    assert_eq!(b.len(), 1);
}

#[test]
fn memory_storage_emits_write_and_remove_events() {
    let storage = MemoryStorage::new();
    let mut rx = storage.subscribe();
    storage.set("k", "v");
    storage.remove("k");

    assert_eq!(
        rx.try_recv().expect("write event"),
        StorageEvent { key: "k".into(), new_value: Some("v".into()) }
    );
    assert_eq!(rx.try_recv().expect("remove event"), StorageEvent { key: "k".into(), new_value: None });
}

#[test]
fn memory_storage_remove_of_missing_key_is_silent() {
    let storage = MemoryStorage::new();
    let mut rx = storage.subscribe();
    storage.remove("absent");
    assert!(rx.try_recv().is_err());
}

#[test]
fn memory_storage_without_subscribers_does_not_fail() {
    let storage = MemoryStorage::new();
    storage.set("k", "v");
    storage.remove("k");
    assert!(storage.is_empty());
}

#[test]
fn noop_storage_never_retains() {
    let storage = NoopStorage;
    storage.set("k", "v");
    assert!(storage.get("k").is_none());
    storage.remove("k");
}
