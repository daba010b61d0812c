//! Ad-hoc message signing relayed to the host.
//!
//! Unlike the link flow, a missing relay is not fatal here: the signature
//! still exists and is returned to the caller, the host just cannot hear
//! about it in this launch context.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::Error;
use crate::host::{self, HostDialog, OutboundRelay};
use crate::relay::SignMessageEnvelope;
use crate::signer::WalletSigner;

/// Signs an arbitrary message and reports it as a `signMessage` envelope.
pub struct MessageSignFlow<S, R, D> {
    signer: Arc<S>,
    relay: Arc<R>,
    dialog: Arc<D>,
    user_id: Option<String>,
}

impl<S, R, D> MessageSignFlow<S, R, D>
where
    S: WalletSigner,
    R: OutboundRelay,
    D: HostDialog,
{
    pub fn new(signer: Arc<S>, relay: Arc<R>, dialog: Arc<D>) -> Self {
        Self {
            signer,
            relay,
            dialog,
            user_id: None,
        }
    }

    /// Attach the host-supplied user id reported in the envelope.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sign `message` with the connected wallet and relay the result.
    pub async fn sign_and_relay(&self, message: &str) -> Result<String, Error> {
        if self.signer.session().is_none() {
            return Err(crate::error::SignerError::NotConnected.into());
        }

        let signature = match self.signer.sign_message(message).await {
            Ok(signature) => signature,
            Err(err) => {
                host::try_alert(
                    self.dialog.as_ref(),
                    "Error",
                    "An error occurred while signing the message.",
                )
                .await;
                return Err(err.into());
            }
        };

        let envelope = SignMessageEnvelope::new(message, &signature, self.user_id.as_deref());
        if self.relay.is_available() {
            match envelope.to_wire() {
                Ok(payload) => {
                    if let Err(err) = self.relay.send(&payload).await {
                        error!(%err, "failed to relay signMessage envelope");
                    } else {
                        info!("signature relayed to host");
                    }
                }
                Err(err) => error!(%err, "failed to encode signMessage envelope"),
            }
        } else {
            warn!("outbound relay unavailable; signature not reported to host");
        }

        host::try_alert(
            self.dialog.as_ref(),
            "Signature Complete",
            "The message was signed and reported to the host.",
        )
        .await;
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::RelayError;
    use crate::host::NoopDialog;
    use crate::relay::{HostboundMessage, decode_hostbound};
    use crate::signer::LocalWalletSigner;

    struct RecordingRelay {
        available: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OutboundRelay for RecordingRelay {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn send(&self, payload: &str) -> Result<(), RelayError> {
            self.sent.lock().unwrap().push(payload.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn signs_and_relays_with_user_id() {
        let signer = Arc::new(LocalWalletSigner::generate(1));
        let relay = Arc::new(RecordingRelay {
            available: true,
            sent: Mutex::new(Vec::new()),
        });
        let flow = MessageSignFlow::new(signer, Arc::clone(&relay), Arc::new(NoopDialog))
            .with_user_id("42");

        let signature = flow.sign_and_relay("Hello World").await.unwrap();
        assert!(signature.starts_with("0x"));

        let sent = relay.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        match decode_hostbound(&sent[0]).unwrap() {
            HostboundMessage::SignMessage(envelope) => {
                assert_eq!(envelope.message, "Hello World");
                assert_eq!(envelope.signature, signature);
                assert_eq!(envelope.user_id, "42");
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_relay_still_returns_the_signature() {
        let signer = Arc::new(LocalWalletSigner::generate(1));
        let relay = Arc::new(RecordingRelay {
            available: false,
            sent: Mutex::new(Vec::new()),
        });
        let flow = MessageSignFlow::new(signer, Arc::clone(&relay), Arc::new(NoopDialog));

        let signature = flow.sign_and_relay("Hello World").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert!(relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnected_wallet_is_rejected() {
        let signer = Arc::new(LocalWalletSigner::generate(1));
        signer.set_connected(false);
        let relay = Arc::new(RecordingRelay {
            available: true,
            sent: Mutex::new(Vec::new()),
        });
        let flow = MessageSignFlow::new(signer, relay, Arc::new(NoopDialog));

        assert!(flow.sign_and_relay("Hello World").await.is_err());
    }
}
