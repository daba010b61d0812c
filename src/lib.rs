//! Wallet linking and transaction relay flows for messaging-host mini apps.
//!
//! Two cooperating state machines share a wallet-signing capability and a
//! one-way outbound-message capability. [`AuthFlowController`] links a
//! wallet to a bot-driven identity: it takes a server-issued nonce from the
//! launch context, builds a canonical challenge, obtains a wallet signature,
//! and relays the signed assertion to the host application.
//! [`TransactionFlowController`] submits a transfer through the wallet and
//! reports both submission and confirmation back to the host.
//!
//! The host surfaces ([`host::OutboundRelay`], [`host::HostDialog`],
//! [`host::HostLifecycle`]) and the wallet ([`WalletSigner`]) are injected
//! capability traits, so every flow runs against fakes in tests. Signature
//! verification is deliberately absent: the crate packages and forwards
//! evidence, verification happens out of process.

pub mod challenge;
pub mod config;
pub mod deeplink;
pub mod error;
pub mod flow;
pub mod host;
pub mod launch;
pub mod relay;
pub mod signer;
pub mod units;

pub use config::LinkConfig;
pub use error::{Error, Result};
pub use flow::{
    AuthFlowController, AuthProgress, AuthState, AuthStep, MessageSignFlow,
    TransactionFlowController, TransactionState, TxPhase,
};
pub use launch::TransactionRequest;
pub use signer::{LocalWalletSigner, WalletSession, WalletSigner};
