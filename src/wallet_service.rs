//! Mock Wallet Service
//!
//! Executes panel commands against the local state store.
//! A real deployment forwards these to the wallet daemon, which builds, signs
//! and broadcasts spend bundles and reports the outcome back into the store.

use crate::state_manager::StateManager;
use crate::types::{
    generate_puzzle_hash, truncate_address, Address, Command, TransactionRecord, WalletId,
};
use crate::units::{mojo_to_chia_string, MOJO_PER_CHIA};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Paid to the farmer's address for every farmed block
pub const FARM_REWARD_MOJO: u64 = 2 * MOJO_PER_CHIA;

pub struct MockWalletService {
    state_manager: Arc<StateManager>,
    dialogs: Mutex<Vec<String>>,
}

impl MockWalletService {
    pub fn new(state_manager: Arc<StateManager>) -> Self {
        Self {
            state_manager,
            dialogs: Mutex::new(Vec::new()),
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::SendTransaction {
                wallet_id,
                amount,
                fee,
                address,
            } => self.send_transaction(wallet_id, amount, fee, address).await,
            Command::FarmBlock { address } => self.farm_block(&address).await,
            Command::GetAddress { wallet_id } => self.get_address(wallet_id).await,
            Command::OpenDialog { message } => {
                warn!("DIALOG: {}", message);
                self.dialogs.lock().await.push(message);
                Ok(())
            }
        }
    }

    /// Messages shown through the dialog channel, oldest first
    pub async fn dialogs(&self) -> Vec<String> {
        self.dialogs.lock().await.clone()
    }

    async fn send_transaction(
        &self,
        wallet_id: WalletId,
        amount: u64,
        fee: u64,
        address: Address,
    ) -> Result<()> {
        let _guard = self.state_manager.lock_wallet(wallet_id).await;

        self.state_manager
            .update_wallet(wallet_id, |wallet| wallet.sending_transaction = true)
            .await?;

        info!(
            "SENDING TX: {} XCH (fee {}) from wallet {} to {}",
            mojo_to_chia_string(amount),
            mojo_to_chia_string(fee),
            wallet_id,
            truncate_address(&address)
        );

        let completed = self
            .state_manager
            .update_wallet(wallet_id, |wallet| {
                wallet.sending_transaction = false;

                let result = match amount.checked_add(fee) {
                    Some(total) if total <= wallet.balance => {
                        wallet.balance -= total;
                        let record = TransactionRecord {
                            to_address: address.clone(),
                            amount,
                            fee_amount: fee,
                            incoming: false,
                            created_at_time: chrono::Utc::now().timestamp(),
                            confirmed_at_index: None,
                        };
                        info!("GENERATED TX: {}", record.format_log());
                        wallet.transactions.push(record);
                        Ok("Transaction has successfully been sent to a full node and included in the mempool.".to_string())
                    }
                    _ => Err(format!(
                        "Insufficient funds: balance is {} XCH",
                        mojo_to_chia_string(wallet.balance)
                    )),
                };

                wallet.send_transaction_result = Some(result.clone());
                result
            })
            .await;

        // A failed write rolls the store back to the sending state
        let result = match completed {
            Ok(result) => result,
            Err(e) => {
                if let Err(clear_err) = self.state_manager.clear_sending(wallet_id).await {
                    warn!("Failed to clear sending flag for wallet {}: {}", wallet_id, clear_err);
                }
                return Err(e);
            }
        };

        match result {
            Ok(_) => info!("SEND SUBMITTED for wallet {}", wallet_id),
            Err(e) => warn!("SEND FAILED for wallet {}: {}", wallet_id, e),
        }

        Ok(())
    }

    async fn farm_block(&self, address: &Address) -> Result<()> {
        let (height, credited) = self
            .state_manager
            .record_block(address, FARM_REWARD_MOJO)
            .await?;

        match credited {
            Some(wallet_id) => info!(
                "FARMED block {} to {}, credited wallet {}",
                height,
                truncate_address(address),
                wallet_id
            ),
            None => info!(
                "FARMED block {} to external address {}",
                height,
                truncate_address(address)
            ),
        }

        Ok(())
    }

    async fn get_address(&self, wallet_id: WalletId) -> Result<()> {
        let address = generate_puzzle_hash();
        self.state_manager
            .update_wallet(wallet_id, |wallet| {
                wallet.address = Some(address.clone());
            })
            .await?;

        info!("NEW ADDRESS for wallet {}: {}", wallet_id, address);
        Ok(())
    }
}
