//! Transaction Submitter
//!
//! Gates and normalizes a send request before it is handed to the wallet service.
//! Checks run in a fixed order and the first failing one is reported; nothing is
//! dispatched from here, the caller acts on the returned [`Outcome`].
use crate::types::{Command, SendRequest, TransactionIntent, WalletId};
use crate::units::chia_to_mojo;
use thiserror::Error;
use tracing::debug;

const CHIA_ADDR_SCHEME: &str = "chia_addr://";

/// User-facing reasons a send is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendRejection {
    #[error("Please finish syncing before making a transaction")]
    Syncing,
    #[error("Please enter a valid numeric amount")]
    InvalidAmount,
    #[error("Please enter a valid numeric fee")]
    InvalidFee,
    #[error("Error: Cannot send chia to coloured address. Please enter a chia address.")]
    ColouredAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A send is already in flight; the request is dropped without feedback
    Suppressed,
    Rejected(SendRejection),
    Ready(TransactionIntent),
}

impl Outcome {
    /// The command the caller should dispatch for this outcome, if any
    pub fn into_command(self) -> Option<Command> {
        match self {
            Outcome::Suppressed => None,
            Outcome::Rejected(rejection) => Some(Command::OpenDialog {
                message: rejection.to_string(),
            }),
            Outcome::Ready(intent) => Some(intent.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionSubmitter;

impl TransactionSubmitter {
    pub fn new() -> Self {
        Self
    }

    pub fn submit(
        &self,
        wallet_id: WalletId,
        sending_in_progress: bool,
        syncing: bool,
        request: &SendRequest,
    ) -> Outcome {
        if sending_in_progress {
            debug!("Send already in progress for wallet {}, ignoring", wallet_id);
            return Outcome::Suppressed;
        }
        if syncing {
            return Outcome::Rejected(SendRejection::Syncing);
        }

        let amount = match chia_to_mojo(&request.raw_amount) {
            Some(amount) if amount > 0 => amount,
            _ => return Outcome::Rejected(SendRejection::InvalidAmount),
        };
        let Some(fee) = parse_fee(&request.raw_fee) else {
            return Outcome::Rejected(SendRejection::InvalidFee);
        };

        let address = match normalize_address(&request.raw_address) {
            Ok(address) => address,
            Err(rejection) => return Outcome::Rejected(rejection),
        };

        Outcome::Ready(TransactionIntent {
            wallet_id,
            amount,
            fee,
            address,
        })
    }
}

/// An untouched fee field is refused, but blank text counts as no fee
fn parse_fee(raw: &str) -> Option<u64> {
    if raw.is_empty() {
        None
    } else if raw.trim().is_empty() {
        Some(0)
    } else {
        chia_to_mojo(raw)
    }
}

/// Trim the address, refuse coloured coins and strip the `chia_addr://` and `0x` prefixes
pub fn normalize_address(raw: &str) -> Result<String, SendRejection> {
    let address = raw.trim();
    if address.contains("colour") {
        return Err(SendRejection::ColouredAddress);
    }

    let address = address.strip_prefix(CHIA_ADDR_SCHEME).unwrap_or(address);
    let address = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    Ok(address.to_string())
}
