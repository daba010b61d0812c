//! Start-parameter decoding.
//!
//! The host application hands the mini app one opaque start parameter,
//! optionally JSON-encoded and optionally base64-wrapped. Decoding policy:
//! attempt a base64 decode first and fall back to the raw string, then
//! attempt a JSON parse. What happens on a JSON failure depends on the flow:
//! the auth flow treats the string itself as the nonce (backward-compatible
//! fallback), the transaction flow reports an input error.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::LaunchParamError;
use crate::units;

/// Transaction request carried in a start parameter.
///
/// `value` is a decimal string in native-currency units; absence of `data`
/// means a plain value transfer. Field names follow the host wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRequest {
    /// Syntactic validation; must pass before a submission is attempted.
    pub fn validate(&self) -> Result<(), LaunchParamError> {
        validate_address(&self.to)?;
        units::native_to_wei(&self.value)?;
        if let Some(data) = &self.data {
            validate_hex_data(data)?;
        }
        Ok(())
    }
}

fn validate_address(value: &str) -> Result<(), LaunchParamError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| LaunchParamError::InvalidField {
            field: "to",
            message: format!("'{value}' is missing the 0x prefix"),
        })?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LaunchParamError::InvalidField {
            field: "to",
            message: format!("'{value}' is not a 20-byte hex address"),
        });
    }
    Ok(())
}

fn validate_hex_data(value: &str) -> Result<(), LaunchParamError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| LaunchParamError::InvalidField {
            field: "data",
            message: "calldata is missing the 0x prefix".to_string(),
        })?;
    if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LaunchParamError::InvalidField {
            field: "data",
            message: "calldata must be an even-length hex string".to_string(),
        });
    }
    Ok(())
}

/// Unwrap an optional base64 layer from a start parameter.
///
/// Anything that is not valid base64 (or does not decode to UTF-8) is
/// passed through untouched.
pub fn decode_start_param(raw: &str) -> Cow<'_, str> {
    match STANDARD.decode(raw) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => {
                debug!("start parameter decoded from base64");
                Cow::Owned(text)
            }
            Err(_) => Cow::Borrowed(raw),
        },
        Err(_) => Cow::Borrowed(raw),
    }
}

/// Extract the authentication nonce from a start parameter.
///
/// A JSON object with a `nonce` field yields that value; a JSON document
/// without one is an input error; anything that fails to parse as JSON is
/// taken verbatim as the nonce.
pub fn nonce_from_start_param(raw: &str) -> Result<String, LaunchParamError> {
    let decoded = decode_start_param(raw);
    match serde_json::from_str::<serde_json::Value>(&decoded) {
        Ok(value) => value
            .get("nonce")
            .and_then(|nonce| nonce.as_str())
            .map(str::to_owned)
            .ok_or(LaunchParamError::MissingNonce),
        Err(_) => {
            debug!("start parameter is not JSON; using it as the nonce");
            Ok(decoded.into_owned())
        }
    }
}

/// Parse and validate a transaction request from a start parameter.
pub fn transaction_request_from_start_param(
    raw: &str,
) -> Result<TransactionRequest, LaunchParamError> {
    let decoded = decode_start_param(raw);
    let request: TransactionRequest = serde_json::from_str(&decoded)
        .map_err(|e| LaunchParamError::UnparsableTransaction(e.to_string()))?;
    request.validate()?;
    Ok(request)
}

/// Generate a fresh single-use nonce for flows launched without one.
pub fn generate_nonce() -> String {
    Uuid::new_v4().to_string()
}
