//! Hostbound relay envelopes.
//!
//! Every message sent over the outbound relay is one of a small closed set,
//! serialized as UTF-8 JSON in the exact shapes the host expects. Envelope
//! constructors capture their timestamp at build time; one envelope is built
//! per milestone, never rebuilt or re-sent.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::challenge::wire_instant;
use crate::error::RelayError;
use crate::launch::TransactionRequest;

pub const ACTION_TRANSACTION_SENT: &str = "transaction_sent";
pub const ACTION_TRANSACTION_CONFIRMED: &str = "transaction_confirmed";
pub const ACTION_TRANSACTION_FAILED: &str = "transaction_failed";
pub const ACTION_SIGN_MESSAGE: &str = "signMessage";
pub const WALLET_LINK_TYPE: &str = "WALLET_LINK";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";

fn wire_timestamp() -> String {
    wire_instant(Utc::now())
}

fn encode<T: Serialize>(envelope: &T) -> Result<String, RelayError> {
    serde_json::to_string(envelope).map_err(|e| RelayError::Encode(e.to_string()))
}

/// Milestone report for a successfully submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSentEnvelope {
    pub action: String,
    pub tx_hash: String,
    pub timestamp: String,
    pub status: String,
    pub transaction_data: TransactionRequest,
}

impl TransactionSentEnvelope {
    pub fn new(tx_hash: impl Into<String>, transaction_data: TransactionRequest) -> Self {
        Self {
            action: ACTION_TRANSACTION_SENT.to_string(),
            tx_hash: tx_hash.into(),
            timestamp: wire_timestamp(),
            status: STATUS_PENDING.to_string(),
            transaction_data,
        }
    }

    pub fn to_wire(&self) -> Result<String, RelayError> {
        encode(self)
    }
}

/// Milestone report for an on-chain confirmed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConfirmedEnvelope {
    pub action: String,
    pub tx_hash: String,
    pub timestamp: String,
    pub status: String,
    pub transaction_data: TransactionRequest,
}

impl TransactionConfirmedEnvelope {
    pub fn new(tx_hash: impl Into<String>, transaction_data: TransactionRequest) -> Self {
        Self {
            action: ACTION_TRANSACTION_CONFIRMED.to_string(),
            tx_hash: tx_hash.into(),
            timestamp: wire_timestamp(),
            status: STATUS_CONFIRMED.to_string(),
            transaction_data,
        }
    }

    pub fn to_wire(&self) -> Result<String, RelayError> {
        encode(self)
    }
}

/// Milestone report for a rejected or failed submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFailedEnvelope {
    pub action: String,
    pub error: String,
    pub timestamp: String,
    pub transaction_data: TransactionRequest,
}

impl TransactionFailedEnvelope {
    pub fn new(error: impl Into<String>, transaction_data: TransactionRequest) -> Self {
        Self {
            action: ACTION_TRANSACTION_FAILED.to_string(),
            error: error.into(),
            timestamp: wire_timestamp(),
            transaction_data,
        }
    }

    pub fn to_wire(&self) -> Result<String, RelayError> {
        encode(self)
    }
}

/// Completed-authentication assertion: address, signature, and the signed
/// challenge text, for out-of-process verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletLinkEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: WalletLinkPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletLinkPayload {
    pub address: String,
    pub signature: String,
    pub message: String,
}

impl WalletLinkEnvelope {
    pub fn new(
        address: impl Into<String>,
        signature: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: WALLET_LINK_TYPE.to_string(),
            payload: WalletLinkPayload {
                address: address.into(),
                signature: signature.into(),
                message: message.into(),
            },
        }
    }

    pub fn to_wire(&self) -> Result<String, RelayError> {
        encode(self)
    }
}

/// Ad-hoc message-signing report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageEnvelope {
    pub action: String,
    pub message: String,
    pub signature: String,
    pub timestamp: String,
    pub user_id: String,
}

impl SignMessageEnvelope {
    pub fn new(
        message: impl Into<String>,
        signature: impl Into<String>,
        user_id: Option<&str>,
    ) -> Self {
        Self {
            action: ACTION_SIGN_MESSAGE.to_string(),
            message: message.into(),
            signature: signature.into(),
            timestamp: wire_timestamp(),
            user_id: user_id.unwrap_or("unknown").to_string(),
        }
    }

    pub fn to_wire(&self) -> Result<String, RelayError> {
        encode(self)
    }
}

/// A hostbound message as the bot-side consumer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostboundMessage {
    TransactionSent(TransactionSentEnvelope),
    TransactionConfirmed(TransactionConfirmedEnvelope),
    TransactionFailed(TransactionFailedEnvelope),
    WalletLink(WalletLinkEnvelope),
    SignMessage(SignMessageEnvelope),
}

/// Decode a relayed payload into its envelope type.
///
/// Dispatches on the `action` tag, falling back to the `type` tag used by
/// the wallet-link assertion.
pub fn decode_hostbound(json: &str) -> Result<HostboundMessage, RelayError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| RelayError::Decode(e.to_string()))?;

    let action = value
        .get("action")
        .and_then(|action| action.as_str())
        .map(str::to_owned);
    let kind = value
        .get("type")
        .and_then(|kind| kind.as_str())
        .map(str::to_owned);

    let typed = |result: serde_json::Result<HostboundMessage>| {
        result.map_err(|e| RelayError::Decode(e.to_string()))
    };

    match action.as_deref() {
        Some(ACTION_TRANSACTION_SENT) => {
            typed(serde_json::from_value(value).map(HostboundMessage::TransactionSent))
        }
        Some(ACTION_TRANSACTION_CONFIRMED) => {
            typed(serde_json::from_value(value).map(HostboundMessage::TransactionConfirmed))
        }
        Some(ACTION_TRANSACTION_FAILED) => {
            typed(serde_json::from_value(value).map(HostboundMessage::TransactionFailed))
        }
        Some(ACTION_SIGN_MESSAGE) => {
            typed(serde_json::from_value(value).map(HostboundMessage::SignMessage))
        }
        Some(other) => Err(RelayError::Decode(format!(
            "unrecognized action tag '{other}'"
        ))),
        None => match kind.as_deref() {
            Some(WALLET_LINK_TYPE) => {
                typed(serde_json::from_value(value).map(HostboundMessage::WalletLink))
            }
            Some(other) => Err(RelayError::Decode(format!(
                "unrecognized type tag '{other}'"
            ))),
            None => Err(RelayError::Decode(
                "payload carries neither an action nor a type tag".to_string(),
            )),
        },
    }
}
