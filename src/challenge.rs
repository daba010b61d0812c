//! Canonical challenge construction for wallet-link authentication.
//!
//! The challenge is the exact text a wallet signs to prove control of an
//! address. It binds the signer address, the relying-party URI, the chain,
//! the single-use nonce, and an issuance timestamp captured exactly once per
//! challenge. Validation of the inputs is the caller's job; this module only
//! serializes.

use chrono::{DateTime, SecondsFormat, Utc};

/// Protocol version constant embedded in every challenge.
pub const VERSION: &str = "1";

/// Inputs binding a challenge to one signer and one flow attempt.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeParams<'a> {
    pub address: &'a str,
    pub chain_id: u64,
    pub nonce: &'a str,
    pub uri: &'a str,
    pub statement: &'a str,
}

/// A challenge plus the issuance instant captured at build time.
///
/// The timestamp is produced once and must be reused wherever the challenge
/// is shown or signed; regenerating it would desynchronize the displayed
/// text from the signed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub text: String,
    pub issued_at: DateTime<Utc>,
}

/// Render the issuance instant the way the wire format expects it.
pub fn wire_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize challenge params into canonical text for a fixed instant.
///
/// Byte-identical output for identical inputs.
pub fn format_at(params: &ChallengeParams<'_>, issued_at: DateTime<Utc>) -> String {
    format!(
        "I wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         {statement}\n\
         \n\
         URI: {uri}\n\
         Version: {version}\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued_at}",
        address = params.address,
        statement = params.statement,
        uri = params.uri,
        version = VERSION,
        chain_id = params.chain_id,
        nonce = params.nonce,
        issued_at = wire_instant(issued_at),
    )
}

/// Build a challenge, capturing the issuance timestamp exactly once.
pub fn issue(params: &ChallengeParams<'_>) -> Challenge {
    let issued_at = Utc::now();
    Challenge {
        text: format_at(params, issued_at),
        issued_at,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn params<'a>() -> ChallengeParams<'a> {
        ChallengeParams {
            address: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            chain_id: 1,
            nonce: "abc123",
            uri: "https://example.com",
            statement: "Please sign with your account",
        }
    }

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn output_is_deterministic_for_fixed_instant() {
        let first = format_at(&params(), fixed_instant());
        let second = format_at(&params(), fixed_instant());
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_inputs_yield_distinct_text() {
        let base = format_at(&params(), fixed_instant());

        let mut other = params();
        other.address = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
        assert_ne!(base, format_at(&other, fixed_instant()));

        let mut other = params();
        other.chain_id = 8453;
        assert_ne!(base, format_at(&other, fixed_instant()));

        let mut other = params();
        other.nonce = "abc124";
        assert_ne!(base, format_at(&other, fixed_instant()));

        let mut other = params();
        other.uri = "https://other.example.com";
        assert_ne!(base, format_at(&other, fixed_instant()));
    }

    #[test]
    fn statement_and_nonce_lines_match_wire_format() {
        let text = format_at(&params(), fixed_instant());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "I wants you to sign in with your Ethereum account:"
        );
        assert_eq!(lines[1], "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Please sign with your account");
        assert!(lines.contains(&"Nonce: abc123"));
        assert!(lines.contains(&"URI: https://example.com"));
        assert!(lines.contains(&"Version: 1"));
        assert!(lines.contains(&"Chain ID: 1"));
    }

    #[test]
    fn issued_at_uses_millisecond_utc() {
        let text = format_at(&params(), fixed_instant());
        assert!(text.ends_with("Issued At: 2025-06-01T12:00:00.000Z"));
    }

    #[test]
    fn issue_returns_the_timestamp_it_serialized() {
        let challenge = issue(&params());
        assert!(
            challenge
                .text
                .ends_with(&format!("Issued At: {}", wire_instant(challenge.issued_at)))
        );
    }
}
