//! State Manager
//!
//! Client-side wallet state that the send panel reads from. Only the wallet
//! service writes to it; every mutation is persisted before it returns, and a
//! mutation whose write fails is rolled back in memory.

use crate::types::{Address, ServiceState, TransactionRecord, WalletId, WalletSendState};
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

pub struct StateManager {
    state: Arc<RwLock<ServiceState>>,
    /// Per-wallet locks so the service runs one operation per wallet at a time
    /// while other wallets proceed concurrently
    wallet_locks: Arc<DashMap<WalletId, Arc<Mutex<()>>>>,

    state_file_path: PathBuf,
}

impl StateManager {
    /// Loads state from the disk
    pub async fn load(state_file_path: PathBuf) -> Result<Self> {
        let mut state = if state_file_path.exists() {
            info!("Loading state from {}", state_file_path.display());
            let content = fs::read_to_string(&state_file_path)
                .await
                .context("Failed to read state file")?;

            serde_json::from_str::<ServiceState>(&content)
                .context("Failed to parse state file")?
        } else {
            info!("No state found, creating new state.");
            ServiceState::new()
        };

        for (id, wallet_state) in state.wallets.iter_mut() {
            // No send survives a restart
            wallet_state.sending_transaction = false;
            debug!(
                "Wallet {}, balance={}, transactions={}",
                id,
                wallet_state.balance,
                wallet_state.transactions.len()
            );
        }

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            wallet_locks: Arc::new(DashMap::new()),
            state_file_path,
        })
    }

    /// Acquire the operation lock for one wallet
    pub async fn lock_wallet(&self, wallet_id: WalletId) -> OwnedMutexGuard<()> {
        let lock = self
            .wallet_locks
            .entry(wallet_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Apply `f` to the whole state and persist it, restoring the previous
    /// state if the write fails
    async fn mutate<T>(&self, f: impl FnOnce(&mut ServiceState) -> T) -> Result<T> {
        let mut state = self.state.write().await;
        let previous = state.clone();

        let out = f(&mut *state);
        state.last_update = chrono::Utc::now().to_rfc3339();

        if let Err(e) = self.persist_locked(&state).await {
            *state = previous;
            return Err(e);
        }

        Ok(out)
    }

    /// Apply `f` to a wallet's state and persist the result
    pub async fn update_wallet<T>(
        &self,
        wallet_id: WalletId,
        f: impl FnOnce(&mut WalletSendState) -> T,
    ) -> Result<T> {
        self.mutate(|state| {
            let wallet_state = state.wallets.entry(wallet_id).or_insert_with(|| {
                info!("Initializing state for new wallet {}", wallet_id);
                WalletSendState::new()
            });
            f(wallet_state)
        })
        .await
        .with_context(|| format!("Failed to persist state for wallet {}", wallet_id))
    }

    /// Clear a wallet's sending flag.
    ///
    /// The flag is cleared in memory even when the write fails: it only guards
    /// the running process and is reset on load.
    pub async fn clear_sending(&self, wallet_id: WalletId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(wallet) = state.wallets.get_mut(&wallet_id) {
            wallet.sending_transaction = false;
        }

        self.persist_locked(&state)
            .await
            .with_context(|| format!("Failed to persist state for wallet {}", wallet_id))
    }

    /// setup new state for a wallet
    pub async fn initialize_wallet(&self, wallet_id: WalletId, balance: u64) -> Result<()> {
        if self.state.read().await.wallets.contains_key(&wallet_id) {
            info!("Wallet {} already initialized", wallet_id);
            return Ok(());
        }

        info!("Initializing wallet {}", wallet_id);

        self.mutate(|state| {
            state.wallets.entry(wallet_id).or_insert_with(|| WalletSendState {
                balance,
                ..WalletSendState::new()
            });
        })
        .await
        .with_context(|| format!("Failed to persist state for new wallet {}", wallet_id))
    }

    pub async fn set_syncing(&self, syncing: bool) -> Result<()> {
        self.mutate(|state| state.syncing = syncing)
            .await
            .context("Failed to persist sync status")
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.read().await.syncing
    }

    pub async fn wallet(&self, wallet_id: WalletId) -> Option<WalletSendState> {
        self.state.read().await.wallets.get(&wallet_id).cloned()
    }

    /// Farm a block paying `reward` to `address`.
    ///
    /// Raises the peak height, confirms every pending transaction at the new
    /// height and credits the wallet whose receive address matches, if any.
    /// Returns the new height and the credited wallet.
    pub async fn record_block(
        &self,
        address: &Address,
        reward: u64,
    ) -> Result<(u32, Option<WalletId>)> {
        self.mutate(|state| {
            state.peak_height += 1;
            let height = state.peak_height;

            for wallet in state.wallets.values_mut() {
                for tx in wallet
                    .transactions
                    .iter_mut()
                    .filter(|tx| tx.confirmed_at_index.is_none())
                {
                    tx.confirmed_at_index = Some(height);
                }
            }

            let farmer = state
                .wallets
                .iter_mut()
                .find(|(_, wallet)| wallet.address.as_ref() == Some(address));

            let credited = farmer.map(|(id, wallet)| {
                wallet.balance = wallet.balance.saturating_add(reward);
                wallet.transactions.push(TransactionRecord {
                    to_address: address.clone(),
                    amount: reward,
                    fee_amount: 0,
                    incoming: true,
                    created_at_time: chrono::Utc::now().timestamp(),
                    confirmed_at_index: Some(height),
                });
                *id
            });

            (height, credited)
        })
        .await
        .context("Failed to persist state after farming a block")
    }

    /// Store the state to a disk.
    async fn persist_locked(&self, state: &ServiceState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        let temp_path = self.state_file_path.with_extension("json.tmp");

        fs::write(&temp_path, &json)
            .await
            .context("Failed to write temporary state file")?;

        let file = fs::File::open(&temp_path).await?;
        file.sync_all().await.context("Failed to fsync state file")?;

        fs::rename(&temp_path, &self.state_file_path)
            .await
            .context("Failed to rename state file")?;

        debug!("State persisted to {}", self.state_file_path.display());

        Ok(())
    }

    pub async fn fetch_snapshot(&self) -> ServiceState {
        self.state.read().await.clone()
    }
}
