//! Wallet signing capability consumed by the flows.
//!
//! The wallet is an untrusted external collaborator: it supplies connection
//! status, message signing, transaction submission, and receipt watching.
//! Controllers never talk to a wallet directly; they hold a [`WalletSigner`]
//! injected at construction.

pub mod local;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;

use crate::error::SignerError;

pub use local::LocalWalletSigner;

/// An established wallet connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub address: String,
    pub chain_id: u64,
}

/// Wallet-facing transaction shape, after unit conversion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionSubmission {
    pub to: String,
    pub value_wei: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Confirmation observations for one submitted transaction.
///
/// `true` means the receipt is confirmed. The wallet layer may report the
/// same observation more than once; consumers must tolerate duplicates.
pub type ReceiptStream = Pin<Box<dyn Stream<Item = bool> + Send>>;

/// Capability surface of a connected wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Current connection, if any.
    fn session(&self) -> Option<WalletSession>;

    /// Request a signature over `message`. Fails on user rejection.
    async fn sign_message(&self, message: &str) -> Result<String, SignerError>;

    /// Submit a transfer through the wallet; returns the transaction hash.
    async fn send_transaction(
        &self,
        submission: &TransactionSubmission,
    ) -> Result<String, SignerError>;

    /// Observe confirmation of a previously submitted hash.
    async fn watch_receipt(&self, tx_hash: &str) -> Result<ReceiptStream, SignerError>;
}
