//! Deterministic in-process signer for development and tests.
//!
//! Holds a secp256k1 key in memory and produces real EIP-191 personal-sign
//! signatures. Submission and confirmation are simulated deterministically:
//! the returned hash is a digest of the submission payload and the receipt
//! stream confirms immediately. Nothing here touches a network.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::SignerError;
use crate::signer::{ReceiptStream, TransactionSubmission, WalletSession, WalletSigner};

/// In-memory wallet with a deterministic simulated chain.
pub struct LocalWalletSigner {
    key: SigningKey,
    address: String,
    chain_id: u64,
    connected: AtomicBool,
}

impl LocalWalletSigner {
    /// Generate a fresh random key.
    pub fn generate(chain_id: u64) -> Self {
        Self::from_key(SigningKey::random(&mut OsRng), chain_id)
    }

    /// Import a private key from a hex string (with or without `0x`).
    pub fn from_hex(private_key: &SecretString, chain_id: u64) -> Result<Self, SignerError> {
        let raw = private_key.expose_secret();
        let bytes = hex::decode(raw.trim().trim_start_matches("0x")).map_err(|e| {
            SignerError::InvalidKey {
                reason: format!("not valid hex: {e}"),
            }
        })?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| SignerError::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self::from_key(key, chain_id))
    }

    fn from_key(key: SigningKey, chain_id: u64) -> Self {
        let address = derive_address(key.verifying_key());
        Self {
            key,
            address,
            chain_id,
            connected: AtomicBool::new(true),
        }
    }

    /// The wallet's address, lowercase hex.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Toggle the simulated connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn require_connected(&self) -> Result<(), SignerError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SignerError::NotConnected)
        }
    }
}

fn derive_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // Skip the SEC1 0x04 prefix byte; the address is the digest's tail.
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

fn eip191_digest(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()));
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

#[async_trait]
impl WalletSigner for LocalWalletSigner {
    fn session(&self) -> Option<WalletSession> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        Some(WalletSession {
            address: self.address.clone(),
            chain_id: self.chain_id,
        })
    }

    async fn sign_message(&self, message: &str) -> Result<String, SignerError> {
        self.require_connected()?;
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&eip191_digest(message))
            .map_err(|e| SignerError::Rejected {
                reason: e.to_string(),
            })?;

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    async fn send_transaction(
        &self,
        submission: &TransactionSubmission,
    ) -> Result<String, SignerError> {
        self.require_connected()?;
        let payload = serde_json::to_vec(submission).map_err(|e| SignerError::Submission {
            reason: format!("failed to encode submission: {e}"),
        })?;

        let mut hasher = Keccak256::new();
        hasher.update(&payload);
        hasher.update(self.address.as_bytes());
        let hash = format!("0x{}", hex::encode(hasher.finalize()));
        debug!(%hash, to = %submission.to, "simulated transaction submission");
        Ok(hash)
    }

    async fn watch_receipt(&self, tx_hash: &str) -> Result<ReceiptStream, SignerError> {
        self.require_connected()?;
        debug!(%tx_hash, "simulated receipt watch; confirming immediately");
        Ok(Box::pin(tokio_stream::iter([true])))
    }
}
