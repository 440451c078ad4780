use std::sync::Barrier;
use std::thread;

use account_store::{AccountStore, NewAccount, StoreConfig, StoreError};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> AccountStore {
    let mut config = StoreConfig::for_path(dir.path().join("accounts.db"));
    config.busy_timeout_ms = 10_000;
    AccountStore::open(&config).unwrap()
}

fn seed(store: &AccountStore, from_balance: f64) -> (i64, i64) {
    let from = store
        .insert_account(&NewAccount::new("Sender", "sender@example.com", from_balance))
        .unwrap();
    let to = store
        .insert_account(&NewAccount::new("Receiver", "receiver@example.com", 0.0))
        .unwrap();
    (from.id, to.id)
}

/// Run one transfer per amount, all threads sharing the same store
fn transfer_concurrently(
    store: &AccountStore,
    from: i64,
    to: i64,
    amounts: &[f64],
) -> Vec<Result<(), StoreError>> {
    let barrier = Barrier::new(amounts.len());

    thread::scope(|s| {
        let handles: Vec<_> = amounts
            .iter()
            .map(|&amount| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    store.transfer_balance(from, to, amount)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn concurrent_transfers_from_same_sender_do_not_lose_updates() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let (from, to) = seed(&store, 100.0);

    let results = transfer_concurrently(&store, from, to, &[30.0, 50.0]);

    for result in &results {
        assert!(result.is_ok(), "both transfers should succeed: {result:?}");
    }
    assert_eq!(store.get_account(from).unwrap().balance, 20.0);
    assert_eq!(store.get_account(to).unwrap().balance, 80.0);
}

#[test]
fn many_pooled_transfers_are_serialized() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let (from, to) = seed(&store, 1000.0);

    for _ in 0..5 {
        let results = transfer_concurrently(&store, from, to, &[10.0; 8]);
        assert!(results.iter().all(|r| r.is_ok()), "got {results:?}");
    }

    assert_eq!(store.get_account(from).unwrap().balance, 600.0);
    assert_eq!(store.get_account(to).unwrap().balance, 400.0);

    let state = store.pool().state();
    assert_eq!(state.idle_connections, state.connections, "all connections returned");
}

#[test]
fn concurrent_overdraw_lets_only_one_transfer_through() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let (from, to) = seed(&store, 100.0);

    let results = transfer_concurrently(&store, from, to, &[70.0, 70.0]);

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| {
            matches!(r, Err(StoreError::InsufficientFunds { balance, .. }) if *balance == 30.0)
        })
        .count();

    assert_eq!(succeeded, 1, "exactly one transfer fits the balance: {results:?}");
    assert_eq!(insufficient, 1, "the other must see the debited balance: {results:?}");
    assert_eq!(store.get_account(from).unwrap().balance, 30.0);
    assert_eq!(store.get_account(to).unwrap().balance, 70.0);
}

#[test]
fn scenario_transfer_then_rejected_overdraw() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let (from, to) = seed(&store, 200.0);

    store.transfer_balance(from, to, 100.0).unwrap();

    assert_eq!(store.get_account(from).unwrap().balance, 100.0);
    assert_eq!(store.get_account(to).unwrap().balance, 100.0);

    let err = store.transfer_balance(from, to, 2000.0).unwrap_err();
    assert!(matches!(err, StoreError::InsufficientFunds { id, .. } if id == from));
    assert_eq!(store.get_account(from).unwrap().balance, 100.0);
}
