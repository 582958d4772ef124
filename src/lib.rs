//! Send panel for a standard chia wallet
pub mod send_card;
pub mod state_manager;
pub mod submitter;
pub mod types;
pub mod units;
pub mod wallet_service;
