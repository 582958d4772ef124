use std::sync::Arc;
use tempfile::TempDir;
use wallet_send::state_manager::StateManager;
use wallet_send::types::TransactionRecord;

fn pending_record(amount: u64) -> TransactionRecord {
    TransactionRecord {
        to_address: "abcdef".to_string(),
        amount,
        fee_amount: 0,
        incoming: false,
        created_at_time: 0,
        confirmed_at_index: None,
    }
}

#[tokio::test]
async fn test_state_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("state.json");

    {
        let state_manager = StateManager::load(state_path.clone()).await.unwrap();
        state_manager.initialize_wallet(1, 500).await.unwrap();
        state_manager
            .update_wallet(1, |wallet| {
                wallet.address = Some("abcdef".to_string());
                wallet.send_transaction_result = Some(Err("boom".to_string()));
            })
            .await
            .unwrap();
        state_manager.set_syncing(true).await.unwrap();
    }

    // Load state again and verify persistence
    {
        let state_manager = StateManager::load(state_path.clone()).await.unwrap();
        let wallet = state_manager.wallet(1).await.unwrap();

        assert_eq!(wallet.balance, 500);
        assert_eq!(wallet.address.as_deref(), Some("abcdef"));
        assert_eq!(wallet.send_transaction_result, Some(Err("boom".to_string())));
        assert!(state_manager.is_syncing().await);
    }
}

#[tokio::test]
async fn test_initialize_wallet_keeps_existing() {
    let temp_dir = TempDir::new().unwrap();
    let state_manager = StateManager::load(temp_dir.path().join("state.json"))
        .await
        .unwrap();

    state_manager.initialize_wallet(1, 100).await.unwrap();
    state_manager.initialize_wallet(1, 999).await.unwrap();

    assert_eq!(state_manager.wallet(1).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_concurrent_updates_on_one_wallet() {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("state.json");
    let state_manager = Arc::new(StateManager::load(state_path).await.unwrap());
    state_manager.initialize_wallet(1, 0).await.unwrap();

    let mut handles = vec![];
    for _ in 0..10 {
        let sm = Arc::clone(&state_manager);
        let handle = tokio::spawn(async move {
            let _guard = sm.lock_wallet(1).await;
            let before = sm.wallet(1).await.unwrap().balance;
            tokio::task::yield_now().await;
            sm.update_wallet(1, |wallet| wallet.balance = before + 1)
                .await
                .unwrap();
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(state_manager.wallet(1).await.unwrap().balance, 10);
}

#[tokio::test]
async fn test_record_block_confirms_and_credits() {
    let temp_dir = TempDir::new().unwrap();
    let state_manager = StateManager::load(temp_dir.path().join("state.json"))
        .await
        .unwrap();

    state_manager.initialize_wallet(1, 0).await.unwrap();
    state_manager.initialize_wallet(2, 0).await.unwrap();
    state_manager
        .update_wallet(1, |wallet| {
            wallet.address = Some("farmer".to_string());
        })
        .await
        .unwrap();
    state_manager
        .update_wallet(2, |wallet| wallet.transactions.push(pending_record(5)))
        .await
        .unwrap();

    let (height, credited) = state_manager
        .record_block(&"farmer".to_string(), 2_000)
        .await
        .unwrap();
    assert_eq!(height, 1);
    assert_eq!(credited, Some(1));

    let farmer = state_manager.wallet(1).await.unwrap();
    assert_eq!(farmer.balance, 2_000);
    assert_eq!(farmer.transactions.len(), 1);
    assert!(farmer.transactions[0].incoming);

    let other = state_manager.wallet(2).await.unwrap();
    assert_eq!(other.transactions[0].confirmed_at_index, Some(1));
    assert_eq!(other.transactions[0].status(), "Confirmed at height 1");

    let (height, credited) = state_manager
        .record_block(&"nobody".to_string(), 2_000)
        .await
        .unwrap();
    assert_eq!(height, 2);
    assert_eq!(credited, None);
}

#[tokio::test]
async fn test_state_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("state.json");
    let state_manager = StateManager::load(state_path).await.unwrap();

    state_manager.initialize_wallet(1, 10).await.unwrap();
    state_manager.initialize_wallet(2, 20).await.unwrap();
    // Unknown wallets are created on first update
    state_manager
        .update_wallet(3, |wallet| wallet.sending_transaction = true)
        .await
        .unwrap();

    let snapshot = state_manager.fetch_snapshot().await;

    assert_eq!(snapshot.wallets.len(), 3);
    assert_eq!(snapshot.wallets.get(&1).unwrap().balance, 10);
    assert_eq!(snapshot.wallets.get(&2).unwrap().balance, 20);
    assert!(snapshot.wallets.get(&3).unwrap().sending_transaction);
    assert!(!snapshot.syncing);
}

#[tokio::test]
async fn test_failed_write_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let state_dir = temp_dir.path().join("data");
    std::fs::create_dir(&state_dir).unwrap();
    let state_manager = StateManager::load(state_dir.join("state.json")).await.unwrap();
    state_manager.initialize_wallet(1, 100).await.unwrap();
    state_manager
        .update_wallet(1, |wallet| wallet.address = Some("farmer".to_string()))
        .await
        .unwrap();

    std::fs::remove_dir_all(&state_dir).unwrap();

    assert!(state_manager
        .update_wallet(1, |wallet| {
            wallet.sending_transaction = true;
            wallet.balance = 0;
        })
        .await
        .is_err());
    assert!(state_manager.set_syncing(true).await.is_err());
    assert!(state_manager
        .record_block(&"farmer".to_string(), 50)
        .await
        .is_err());
    assert!(state_manager.initialize_wallet(2, 10).await.is_err());

    let snapshot = state_manager.fetch_snapshot().await;
    let wallet = snapshot.wallets.get(&1).unwrap();
    assert!(!wallet.sending_transaction);
    assert_eq!(wallet.balance, 100);
    assert!(wallet.transactions.is_empty());
    assert!(!snapshot.syncing);
    assert_eq!(snapshot.peak_height, 0);
    assert!(!snapshot.wallets.contains_key(&2));

    // Writes succeed again once the directory is back
    std::fs::create_dir(&state_dir).unwrap();
    state_manager.set_syncing(true).await.unwrap();
    assert!(state_manager.is_syncing().await);
}

#[tokio::test]
async fn test_clear_sending_applies_without_disk() {
    let temp_dir = TempDir::new().unwrap();
    let state_dir = temp_dir.path().join("data");
    std::fs::create_dir(&state_dir).unwrap();
    let state_manager = StateManager::load(state_dir.join("state.json")).await.unwrap();
    state_manager
        .update_wallet(1, |wallet| wallet.sending_transaction = true)
        .await
        .unwrap();

    std::fs::remove_dir_all(&state_dir).unwrap();

    assert!(state_manager.clear_sending(1).await.is_err());
    assert!(!state_manager.wallet(1).await.unwrap().sending_transaction);
}

#[tokio::test]
async fn test_load_resets_sending_flags() {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("state.json");

    {
        let state_manager = StateManager::load(state_path.clone()).await.unwrap();
        state_manager
            .update_wallet(1, |wallet| wallet.sending_transaction = true)
            .await
            .unwrap();
    }

    let state_manager = StateManager::load(state_path).await.unwrap();
    assert!(!state_manager.wallet(1).await.unwrap().sending_transaction);
}
