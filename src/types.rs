//! Core data types for the wallet send panel

use crate::units::mojo_to_chia_string;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Address = String;
pub type WalletId = u32;

/// Outcome of a send as reported by the wallet service: success or error message
pub type SendResult = Result<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wallets: Vec<WalletConfig>,
    /// Enables the farm action, which only makes sense against a simulator
    #[serde(default)]
    pub local_test: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub id: WalletId,
    pub label: String,
}

/// Raw text of the send form at the moment the user presses send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub raw_address: String,
    pub raw_amount: String,
    pub raw_fee: String,
}

impl SendRequest {
    pub fn new(
        raw_address: impl Into<String>,
        raw_amount: impl Into<String>,
        raw_fee: impl Into<String>,
    ) -> Self {
        Self {
            raw_address: raw_address.into(),
            raw_amount: raw_amount.into(),
            raw_fee: raw_fee.into(),
        }
    }
}

/// A validated send, amounts in mojo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub wallet_id: WalletId,
    pub amount: u64,
    pub fee: u64,
    pub address: Address,
}

/// Actions accepted by the wallet service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SendTransaction {
        wallet_id: WalletId,
        amount: u64,
        fee: u64,
        address: Address,
    },
    FarmBlock {
        address: Address,
    },
    GetAddress {
        wallet_id: WalletId,
    },
    OpenDialog {
        message: String,
    },
}

impl From<TransactionIntent> for Command {
    fn from(intent: TransactionIntent) -> Self {
        Command::SendTransaction {
            wallet_id: intent.wallet_id,
            amount: intent.amount,
            fee: intent.fee,
            address: intent.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub to_address: Address,
    pub amount: u64,
    pub fee_amount: u64,
    pub incoming: bool,
    pub created_at_time: i64,
    pub confirmed_at_index: Option<u32>,
}

impl TransactionRecord {
    pub fn direction(&self) -> &'static str {
        if self.incoming {
            "Incoming"
        } else {
            "Outgoing"
        }
    }

    pub fn status(&self) -> String {
        match self.confirmed_at_index {
            Some(height) => format!("Confirmed at height {}", height),
            None => "Pending".to_string(),
        }
    }

    pub fn format_log(&self) -> String {
        format!(
            "{} {} XCH (fee {}) to {} [{}]",
            self.direction(),
            mojo_to_chia_string(self.amount),
            mojo_to_chia_string(self.fee_amount),
            truncate_address(&self.to_address),
            self.status()
        )
    }
}

/// Client-side state of one wallet, written by the wallet service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletSendState {
    pub sending_transaction: bool,
    pub send_transaction_result: Option<SendResult>,
    pub address: Option<Address>,
    pub balance: u64,
    pub transactions: Vec<TransactionRecord>,
}

/// Result line shown under the send form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResultView {
    pub message: String,
    pub success: bool,
}

impl WalletSendState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_view(&self) -> TransactionResultView {
        match &self.send_transaction_result {
            Some(Ok(message)) => TransactionResultView {
                message: message.clone(),
                success: true,
            },
            Some(Err(message)) => TransactionResultView {
                message: message.clone(),
                success: false,
            },
            None => TransactionResultView {
                message: String::new(),
                success: false,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceState {
    pub syncing: bool,
    #[serde(default)]
    pub peak_height: u32,
    pub wallets: HashMap<WalletId, WalletSendState>,
    pub last_update: String,
}

impl ServiceState {
    pub fn new() -> Self {
        Self {
            syncing: false,
            peak_height: 0,
            wallets: HashMap::new(),
            last_update: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn truncate_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    match (address.get(..6), address.get(address.len() - 4..)) {
        (Some(head), Some(tail)) => format!("{}...{}", head, tail),
        _ => address.to_string(),
    }
}

/// Random 32-byte puzzle hash, hex encoded
pub fn generate_puzzle_hash() -> Address {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);

    hex::encode(bytes)
}
