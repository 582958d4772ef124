//! Wallet Send Panel
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use wallet_send::send_card::SendCard;
use wallet_send::state_manager::StateManager;
use wallet_send::submitter::Outcome;
use wallet_send::types::*;
use wallet_send::units::{chia_to_mojo, mojo_to_chia_string};
use wallet_send::wallet_service::MockWalletService;

#[derive(Parser)]
#[command(name = "wallet_send")]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    InitState {
        #[arg(long, default_value = "1")]
        num_wallets: u32,

        /// Starting balance of every wallet, in XCH
        #[arg(long, default_value = "10")]
        balance: String,

        /// Allow farming blocks (simulator only)
        #[arg(long)]
        local_test: bool,
    },

    Send {
        #[arg(long, default_value = "1")]
        wallet_id: WalletId,

        #[arg(long)]
        address: String,

        #[arg(long)]
        amount: String,

        #[arg(long, default_value = "0")]
        fee: String,
    },

    Farm {
        #[arg(long, default_value = "1")]
        wallet_id: WalletId,

        #[arg(long)]
        address: String,
    },

    NewAddress {
        #[arg(long, default_value = "1")]
        wallet_id: WalletId,
    },

    SetSyncing {
        #[arg(action = clap::ArgAction::Set)]
        syncing: bool,
    },

    Status {
        #[arg(long, default_value = "1")]
        wallet_id: WalletId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_send=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Loading state from {}", cli.state.display());
    let state_manager = Arc::new(StateManager::load(cli.state.clone()).await?);

    // init-state writes the config instead of reading it
    if let Commands::InitState {
        num_wallets,
        balance,
        local_test,
    } = &cli.command
    {
        let Some(balance) = chia_to_mojo(balance) else {
            bail!("Invalid starting balance: {}", balance);
        };

        info!("Initializing configuration and state...");
        let wallets: Vec<WalletConfig> = (1..=*num_wallets)
            .map(|id| WalletConfig {
                id,
                label: format!("Chia Wallet {}", id),
            })
            .collect();

        let config = Config {
            wallets,
            local_test: *local_test,
        };
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?;

        tokio::fs::write(&cli.config, config_json)
            .await
            .context("Failed to write configuration file")?;

        info!("✓ Created configuration file: {}", cli.config.display());

        let service = Arc::new(MockWalletService::new(state_manager.clone()));
        for wallet_config in &config.wallets {
            state_manager
                .initialize_wallet(wallet_config.id, balance)
                .await?;
            let card = SendCard::new(
                wallet_config.id,
                config.local_test,
                state_manager.clone(),
                service.clone(),
            );
            card.new_address().await?;
        }

        let state = state_manager.fetch_snapshot().await;
        info!(
            "Initialized {} wallets with {} XCH each",
            state.wallets.len(),
            mojo_to_chia_string(balance)
        );
        return Ok(());
    }

    info!("Loading configuration from {}", cli.config.display());
    let config_content = tokio::fs::read_to_string(&cli.config)
        .await
        .context("Failed to read config file")?;

    let config: Config =
        serde_json::from_str(&config_content).context("Failed to parse config file")?;

    info!("Configuration loaded:");
    info!("  Wallets: {}", config.wallets.len());
    info!("  Local test: {}", config.local_test);

    let service = Arc::new(MockWalletService::new(state_manager.clone()));
    let card_for = |wallet_id: WalletId| -> Result<SendCard> {
        if !config.wallets.iter().any(|w| w.id == wallet_id) {
            bail!("Wallet {} is not configured", wallet_id);
        }
        Ok(SendCard::new(
            wallet_id,
            config.local_test,
            state_manager.clone(),
            service.clone(),
        ))
    };

    match cli.command {
        Commands::Send {
            wallet_id,
            address,
            amount,
            fee,
        } => {
            let mut card = card_for(wallet_id)?;
            card.fill(address, amount, fee);
            match card.send().await? {
                Outcome::Ready(intent) => {
                    let view = card.result_view().await;
                    info!(
                        "Sent {} XCH to {}: {}",
                        mojo_to_chia_string(intent.amount),
                        intent.address,
                        view.message
                    );
                }
                Outcome::Rejected(rejection) => info!("Send rejected: {}", rejection),
                Outcome::Suppressed => info!("A send is already in progress"),
            }
        }
        Commands::Farm { wallet_id, address } => {
            let mut card = card_for(wallet_id)?;
            card.address = address;
            if !card.farm().await? {
                info!("No block farmed");
            }
        }
        Commands::NewAddress { wallet_id } => {
            card_for(wallet_id)?.new_address().await?;
        }
        Commands::SetSyncing { syncing } => {
            state_manager.set_syncing(syncing).await?;
            info!("Syncing set to {}", syncing);
        }
        Commands::Status { wallet_id } => {
            let card = card_for(wallet_id)?;
            let Some(wallet) = state_manager.wallet(wallet_id).await else {
                bail!("Wallet {} has no state, run init-state first", wallet_id);
            };
            let view = card.result_view().await;

            info!("Wallet {}:", wallet_id);
            info!("  Balance: {} XCH", mojo_to_chia_string(wallet.balance));
            info!(
                "  Receive address: {}",
                wallet.address.as_deref().unwrap_or("-")
            );
            info!("  Syncing: {}", state_manager.is_syncing().await);
            if !view.message.is_empty() {
                let label = if view.success { "ok" } else { "failed" };
                info!("  Last send ({}): {}", label, view.message);
            }
            for tx in &wallet.transactions {
                info!("  {}", tx.format_log());
            }
        }
        Commands::InitState { .. } => {
            unreachable!("InitState handled above");
        }
    }

    Ok(())
}
