use rollcall_store::{
    ClaimRef, ItemStatus, QueueItem, QueueStore, Receipt, StoreError, SubmissionError,
};
use rollcall_store_lmdb::LmdbEnvironment;
use rollcall_types::{ClaimDigest, ItemId, NonceDigest, Timestamp, ZoneDigest};

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn item(seed: u8, sequence: u64) -> QueueItem {
    QueueItem {
        id: ItemId::new([seed; 32]),
        sequence,
        envelope: vec![seed; 48],
        claim: ClaimRef {
            digest: ClaimDigest::new([seed; 32]),
            event_id: format!("evt-{seed}"),
            issuer: "ab".repeat(32),
            nonce: NonceDigest::new([seed.wrapping_add(1); 32]),
            zones: vec![ZoneDigest::new([seed.wrapping_add(2); 32])],
        },
        created_at: Timestamp::new(1_000),
        status: ItemStatus::Signed,
        retry_count: 0,
        retry_base: 0,
        next_attempt_at: Timestamp::new(1_000),
        receipt: None,
        last_error: None,
        updated_at: Timestamp::new(1_000),
    }
}

#[test]
fn insert_get_update_delete() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.queue_store();

    let mut a = item(1, 0);
    assert!(store.insert_item_if_absent(&a).unwrap());
    assert!(!store.insert_item_if_absent(&a).unwrap());
    assert_eq!(store.get_item(&a.id).unwrap(), a);

    a.status = ItemStatus::Pending;
    a.retry_count = 2;
    a.last_error = Some(SubmissionError::SubmissionServerError("502".into()));
    a.receipt = Some(Receipt {
        tx_id: "tx-1".into(),
        submitted_at: Timestamp::new(1_010),
    });
    store.put_item(&a).unwrap();
    assert_eq!(store.get_item(&a.id).unwrap(), a);

    store.delete_item(&a.id).unwrap();
    assert!(matches!(store.get_item(&a.id), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete_item(&a.id), Err(StoreError::NotFound(_))));
}

#[test]
fn conditional_delete_checks_stored_value() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.queue_store();

    let mut a = item(1, 0);
    store.insert_item_if_absent(&a).unwrap();
    let failed = |i: &QueueItem| i.status == ItemStatus::Failed;

    assert!(!store.delete_item_if(&a.id, &failed).unwrap());
    assert_eq!(store.item_count().unwrap(), 1);

    a.status = ItemStatus::Failed;
    store.put_item(&a).unwrap();
    assert!(store.delete_item_if(&a.id, &failed).unwrap());
    assert_eq!(store.item_count().unwrap(), 0);

    assert!(!store.delete_item_if(&a.id, &failed).unwrap());
}

#[test]
fn put_requires_existing_item() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.queue_store();
    assert!(matches!(store.put_item(&item(9, 0)), Err(StoreError::NotFound(_))));
    assert_eq!(store.item_count().unwrap(), 0);
}

#[test]
fn sequence_is_monotonic_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let store = env.queue_store();
        assert_eq!(store.next_sequence().unwrap(), 0);
        assert_eq!(store.next_sequence().unwrap(), 1);
    }
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    assert_eq!(env.queue_store().next_sequence().unwrap(), 2);
}

#[test]
fn items_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let store = env.queue_store();
        store.insert_item_if_absent(&item(1, 0)).unwrap();
        store.insert_item_if_absent(&item(2, 1)).unwrap();
        env.sync().unwrap();
    }
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.queue_store();
    let mut items = store.iter_items().unwrap();
    items.sort_by_key(|i| i.sequence);
    assert_eq!(items, vec![item(1, 0), item(2, 1)]);
    assert_eq!(store.item_count().unwrap(), 2);
}
