//! Send Card
//!
//! Drives the send panel of one wallet: holds the raw form inputs, reads the
//! store, runs the submitter and dispatches whatever it decides.
use crate::state_manager::StateManager;
use crate::submitter::{Outcome, TransactionSubmitter};
use crate::types::{Command, SendRequest, TransactionResultView, WalletId};
use crate::wallet_service::MockWalletService;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SendCard {
    wallet_id: WalletId,
    local_test: bool,
    submitter: TransactionSubmitter,
    state_manager: Arc<StateManager>,
    service: Arc<MockWalletService>,

    pub address: String,
    pub amount: String,
    pub fee: String,
}

impl SendCard {
    pub fn new(
        wallet_id: WalletId,
        local_test: bool,
        state_manager: Arc<StateManager>,
        service: Arc<MockWalletService>,
    ) -> Self {
        Self {
            wallet_id,
            local_test,
            submitter: TransactionSubmitter::new(),
            state_manager,
            service,
            address: String::new(),
            amount: String::new(),
            fee: String::new(),
        }
    }

    /// Fill all three form fields at once
    pub fn fill(
        &mut self,
        address: impl Into<String>,
        amount: impl Into<String>,
        fee: impl Into<String>,
    ) {
        self.address = address.into();
        self.amount = amount.into();
        self.fee = fee.into();
    }

    /// Press send.
    ///
    /// Inputs are cleared only when a transaction was dispatched; a rejection
    /// leaves them in place for the user to correct.
    pub async fn send(&mut self) -> Result<Outcome> {
        let sending = self
            .state_manager
            .wallet(self.wallet_id)
            .await
            .is_some_and(|wallet| wallet.sending_transaction);
        let syncing = self.state_manager.is_syncing().await;

        let request = SendRequest::new(&*self.address, &*self.amount, &*self.fee);
        let outcome = self
            .submitter
            .submit(self.wallet_id, sending, syncing, &request);

        if let Some(command) = outcome.clone().into_command() {
            self.service.dispatch(command).await?;
        }

        if let Outcome::Ready(intent) = &outcome {
            info!(
                "Dispatched send of {} mojo from wallet {}",
                intent.amount, intent.wallet_id
            );
            self.address.clear();
            self.amount.clear();
            self.fee.clear();
        }

        Ok(outcome)
    }

    /// Farm a block to the address in the form. Returns whether a block was requested.
    pub async fn farm(&self) -> Result<bool> {
        if !self.local_test {
            warn!("Farming is only available on local test networks");
            return Ok(false);
        }
        if self.address.is_empty() {
            return Ok(false);
        }

        self.service
            .dispatch(Command::FarmBlock {
                address: self.address.clone(),
            })
            .await?;
        Ok(true)
    }

    pub async fn new_address(&self) -> Result<()> {
        self.service
            .dispatch(Command::GetAddress {
                wallet_id: self.wallet_id,
            })
            .await
    }

    pub async fn result_view(&self) -> TransactionResultView {
        self.state_manager
            .wallet(self.wallet_id)
            .await
            .unwrap_or_default()
            .result_view()
    }
}
