//! Wallet-link authentication flow.
//!
//! Drives `connecting → signing → sending → completed`, with `error`
//! terminal and reachable from any non-terminal step. Inputs arrive as
//! discrete events: the launch-context start parameter supplies the nonce,
//! wallet connection events supply the session. The flow trigger fires at
//! most once per (address, nonce) pair, so repeated connection events after
//! completion can never re-sign or re-send.

use std::sync::Arc;

use tracing::{debug, info};

use crate::challenge::{self, ChallengeParams};
use crate::config::LinkConfig;
use crate::error::{Error, RelayError};
use crate::host::{self, HostDialog, HostLifecycle, OutboundRelay};
use crate::launch;
use crate::relay::WalletLinkEnvelope;
use crate::signer::WalletSigner;

/// Steps of the authentication state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStep {
    #[default]
    Connecting,
    Signing,
    Sending,
    Completed,
    Error,
}

impl AuthStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Signing => "signing",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Observable state of one authentication attempt.
///
/// `message` holds the challenge text while the flow is healthy and an error
/// description once it is not; `signature` is populated only in `sending`
/// and `completed`.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    step: AuthStep,
    message: Option<String>,
    nonce: Option<String>,
    signature: Option<String>,
}

impl AuthState {
    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// Outcome of feeding one connection event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProgress {
    /// Preconditions not yet met; still waiting for nonce or connection.
    Waiting,
    /// The flow already ran for this (address, nonce) pair or is terminal.
    AlreadyHandled,
    /// The flow ran to completion and the assertion was relayed.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttemptKey {
    address: String,
    nonce: String,
}

/// Drives one wallet-link authentication attempt.
pub struct AuthFlowController<S, R, D, L> {
    signer: Arc<S>,
    relay: Arc<R>,
    dialog: Arc<D>,
    lifecycle: Arc<L>,
    config: LinkConfig,
    state: AuthState,
    attempted: Option<AttemptKey>,
}

impl<S, R, D, L> AuthFlowController<S, R, D, L>
where
    S: WalletSigner,
    R: OutboundRelay,
    D: HostDialog,
    L: HostLifecycle + 'static,
{
    pub fn new(
        signer: Arc<S>,
        relay: Arc<R>,
        dialog: Arc<D>,
        lifecycle: Arc<L>,
        config: LinkConfig,
    ) -> Self {
        Self {
            signer,
            relay,
            dialog,
            lifecycle,
            config,
            state: AuthState::default(),
            attempted: None,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Feed the launch-context start parameter.
    ///
    /// The nonce is immutable once accepted: a second call cannot replace
    /// it, a fresh flow needs a fresh controller. A JSON start parameter
    /// without a nonce is an input error surfaced through the host dialog;
    /// the flow stays in `connecting` and never advances.
    pub async fn ingest_start_param(&mut self, raw: &str) -> Result<(), Error> {
        if self.state.nonce.is_some() {
            debug!("nonce already accepted; ignoring repeated start parameter");
            return Ok(());
        }
        match launch::nonce_from_start_param(raw) {
            Ok(nonce) => {
                debug!(%nonce, "nonce extracted from start parameter");
                self.state.nonce = Some(nonce);
                Ok(())
            }
            Err(err) => {
                host::try_alert(
                    self.dialog.as_ref(),
                    "Error",
                    "No nonce found in start parameters.",
                )
                .await;
                Err(err.into())
            }
        }
    }

    /// Feed a wallet connection event.
    ///
    /// This is the single flow trigger: when a connected session and a nonce
    /// are both present, the whole signing-and-relaying sequence runs to a
    /// terminal step. Repeat events are answered with
    /// [`AuthProgress::AlreadyHandled`] and have no side effects.
    pub async fn on_connection_event(&mut self) -> Result<AuthProgress, Error> {
        if self.state.step != AuthStep::Connecting {
            return Ok(AuthProgress::AlreadyHandled);
        }
        let Some(session) = self.signer.session() else {
            debug!("waiting for wallet connection");
            return Ok(AuthProgress::Waiting);
        };
        let Some(nonce) = self.state.nonce.clone() else {
            debug!("wallet connected but no nonce yet");
            return Ok(AuthProgress::Waiting);
        };

        let key = AttemptKey {
            address: session.address.clone(),
            nonce: nonce.clone(),
        };
        if self.attempted.as_ref() == Some(&key) {
            return Ok(AuthProgress::AlreadyHandled);
        }
        self.attempted = Some(key);

        match self.run_link_flow(&session.address, &nonce).await {
            Ok(()) => Ok(AuthProgress::Completed),
            Err(err) => {
                let description = err.to_string();
                self.state.step = AuthStep::Error;
                self.state.message = Some(description.clone());
                self.state.signature = None;
                host::try_alert(self.dialog.as_ref(), "Authentication Error", &description).await;
                Err(err)
            }
        }
    }

    async fn run_link_flow(&mut self, address: &str, nonce: &str) -> Result<(), Error> {
        self.state.step = AuthStep::Signing;
        let params = ChallengeParams {
            address,
            chain_id: self.config.primary_chain(),
            nonce,
            uri: self.config.uri(),
            statement: &self.config.statement,
        };
        let built = challenge::issue(&params);
        // The displayed text and the signed bytes are the same value; the
        // challenge is never rebuilt between here and the relay.
        self.state.message = Some(built.text.clone());

        info!(chain_id = params.chain_id, "requesting wallet-link signature");
        let signature = self.signer.sign_message(&built.text).await?;

        self.state.signature = Some(signature.clone());
        self.state.step = AuthStep::Sending;

        if !self.relay.is_available() {
            return Err(RelayError::Unavailable.into());
        }
        let envelope = WalletLinkEnvelope::new(address, &signature, &built.text);
        self.relay.send(&envelope.to_wire()?).await?;

        self.state.step = AuthStep::Completed;
        info!("wallet link relayed; scheduling host teardown");
        self.schedule_teardown();
        Ok(())
    }

    /// Give the host UI time to render the confirmation, then ask the host
    /// to close the mini app. Runs detached and holds only the lifecycle
    /// capability, so a discarded controller is never resurrected.
    fn schedule_teardown(&self) {
        let lifecycle = Arc::clone(&self.lifecycle);
        let delay = self.config.close_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if lifecycle.close_available() {
                lifecycle.close().await;
            } else {
                debug!("host teardown unavailable; leaving mini app open");
            }
        });
    }
}
