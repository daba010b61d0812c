//! Bot deep links that launch the mini app with a prefilled request.
//!
//! The bot side embeds a transaction request into a start parameter:
//! base64-wrapped JSON appended to the bot's app link. The launch decoder
//! reverses this exactly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use crate::error::{ConfigError, Error, LaunchParamError};
use crate::launch::TransactionRequest;

/// Encode a request into a start-parameter string.
pub fn encode_start_param(request: &TransactionRequest) -> Result<String, LaunchParamError> {
    let json =
        serde_json::to_string(request).map_err(|e| LaunchParamError::Encode(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Build a bot link carrying the encoded request as its `startapp` param.
pub fn bot_link(bot_username: &str, request: &TransactionRequest) -> Result<Url, Error> {
    let username = bot_username.trim().trim_start_matches('@');
    if username.is_empty() || !username.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(ConfigError::InvalidValue {
            key: "bot_username".to_string(),
            message: format!("'{bot_username}' is not a valid bot username"),
        }
        .into());
    }

    let encoded = encode_start_param(request)?;
    let mut url = Url::parse(&format!("https://t.me/{username}")).map_err(|e| {
        ConfigError::InvalidValue {
            key: "bot_username".to_string(),
            message: e.to_string(),
        }
    })?;
    url.query_pairs_mut().append_pair("startapp", &encoded);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch;

    fn request() -> TransactionRequest {
        TransactionRequest {
            to: "0x742d35Cc6537C0532925a3b8C17Eb02b80D4E4AE".to_string(),
            value: "0.005".to_string(),
            data: None,
            chain_id: Some(1),
            description: Some("custom transfer".to_string()),
        }
    }

    #[test]
    fn link_round_trips_through_the_launch_decoder() {
        let url = bot_link("my_bot", &request()).unwrap();
        assert!(url.as_str().starts_with("https://t.me/my_bot?startapp="));

        let (_, encoded) = url
            .query_pairs()
            .find(|(key, _)| key == "startapp")
            .unwrap();
        let decoded = launch::transaction_request_from_start_param(&encoded).unwrap();
        assert_eq!(decoded, request());
    }

    #[test]
    fn leading_at_sign_is_tolerated() {
        let url = bot_link("@my_bot", &request()).unwrap();
        assert!(url.as_str().contains("t.me/my_bot"));
    }

    #[test]
    fn rejects_invalid_usernames() {
        assert!(bot_link("", &request()).is_err());
        assert!(bot_link("bad name", &request()).is_err());
        assert!(bot_link("bad/../name", &request()).is_err());
    }
}
