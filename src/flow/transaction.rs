//! Transaction submission and confirmation tracking.
//!
//! Drives `idle → submitting → pending-confirmation → confirmed | failed`.
//! Two milestones are relayed to the host: submission (`transaction_sent` or
//! `transaction_failed`) and confirmation (`transaction_confirmed`, exactly
//! once). `pending-confirmation` is the only state allowed to stay active
//! across unbounded wall-clock time; block confirmation latency is outside
//! this controller's control.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::{Error, RelayError, SignerError, TransactionFlowError};
use crate::host::{self, HostDialog, OutboundRelay};
use crate::launch::TransactionRequest;
use crate::relay::{
    TransactionConfirmedEnvelope, TransactionFailedEnvelope, TransactionSentEnvelope,
};
use crate::signer::{TransactionSubmission, WalletSigner};
use crate::units;

/// Machine state derived from the tracked flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Idle,
    Submitting,
    PendingConfirmation,
    Confirmed,
    Failed,
}

/// Observable state of one transaction lifecycle.
///
/// `processing` is true exactly between the submission request and hash
/// receipt (or failure); `confirmed` implies `hash` is set and `confirming`
/// has gone back to false.
#[derive(Debug, Clone, Default)]
pub struct TransactionState {
    hash: Option<String>,
    processing: bool,
    confirming: bool,
    confirmed: bool,
}

impl TransactionState {
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

/// Drives one submission-then-confirmation cycle.
pub struct TransactionFlowController<S, R, D> {
    signer: Arc<S>,
    relay: Arc<R>,
    dialog: Arc<D>,
    request: TransactionRequest,
    state: TransactionState,
    failure: Option<String>,
    confirmation_relayed: bool,
}

impl<S, R, D> TransactionFlowController<S, R, D>
where
    S: WalletSigner,
    R: OutboundRelay,
    D: HostDialog,
{
    /// Validate the caller-supplied request and build an idle controller.
    pub fn new(
        signer: Arc<S>,
        relay: Arc<R>,
        dialog: Arc<D>,
        request: TransactionRequest,
    ) -> Result<Self, Error> {
        request.validate()?;
        Ok(Self {
            signer,
            relay,
            dialog,
            request,
            state: TransactionState::default(),
            failure: None,
            confirmation_relayed: false,
        })
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    /// Failure description once the flow is in [`TxPhase::Failed`].
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn phase(&self) -> TxPhase {
        if self.failure.is_some() {
            TxPhase::Failed
        } else if self.state.confirmed {
            TxPhase::Confirmed
        } else if self.state.confirming {
            TxPhase::PendingConfirmation
        } else if self.state.processing {
            TxPhase::Submitting
        } else {
            TxPhase::Idle
        }
    }

    /// Submit the request through the wallet and relay the outcome.
    ///
    /// Requires an active wallet session and an available relay: without the
    /// relay the outcome could never reach the host, so the flow fails
    /// before the wallet is touched and no envelope is attempted.
    pub async fn submit(&mut self) -> Result<String, Error> {
        if self.phase() != TxPhase::Idle {
            return Err(TransactionFlowError::AlreadySubmitted.into());
        }
        if self.signer.session().is_none() {
            host::try_alert(
                self.dialog.as_ref(),
                "Transaction Failed",
                "No wallet session is connected.",
            )
            .await;
            return Err(SignerError::NotConnected.into());
        }
        if !self.relay.is_available() {
            let err = RelayError::Unavailable;
            self.failure = Some(err.to_string());
            host::try_alert(self.dialog.as_ref(), "Transaction Failed", &err.to_string()).await;
            return Err(err.into());
        }

        let submission = TransactionSubmission {
            to: self.request.to.clone(),
            value_wei: units::native_to_wei(&self.request.value)?,
            data: self.request.data.clone(),
        };

        self.state.processing = true;
        info!(to = %submission.to, value_wei = submission.value_wei, "submitting transaction");
        match self.signer.send_transaction(&submission).await {
            Ok(hash) => {
                self.state.processing = false;
                self.state.hash = Some(hash.clone());
                self.state.confirming = true;
                info!(%hash, "transaction submitted");

                let envelope = TransactionSentEnvelope::new(&hash, self.request.clone());
                self.relay_milestone("transaction_sent", envelope.to_wire()).await;
                Ok(hash)
            }
            Err(err) => {
                self.state.processing = false;
                let description = err.to_string();
                self.failure = Some(description.clone());
                warn!(%description, "transaction submission failed");

                let envelope = TransactionFailedEnvelope::new(&description, self.request.clone());
                self.relay_milestone("transaction_failed", envelope.to_wire()).await;
                host::try_alert(
                    self.dialog.as_ref(),
                    "Transaction Failed",
                    &format!("Failed to send the transaction: {description}"),
                )
                .await;
                Err(err.into())
            }
        }
    }

    /// Watch the submitted hash until the receipt confirms, then relay the
    /// confirmation exactly once.
    ///
    /// Safe to call again after confirmation (a no-op) and tolerant of an
    /// observer that reports "confirmed" more than once. Observation-layer
    /// faults are surfaced as errors without changing the transaction state.
    pub async fn await_confirmation(&mut self) -> Result<(), Error> {
        if self.state.confirmed {
            debug!("confirmation already observed; nothing to do");
            return Ok(());
        }
        let Some(hash) = self.state.hash.clone() else {
            return Err(TransactionFlowError::NothingToConfirm.into());
        };

        let mut receipts = self.signer.watch_receipt(&hash).await.map_err(|err| {
            warn!(%hash, %err, "receipt watch could not be established");
            Error::from(err)
        })?;

        while let Some(confirmed) = receipts.next().await {
            if !confirmed {
                debug!(%hash, "receipt observed but not yet confirmed");
                continue;
            }
            self.mark_confirmed(&hash).await;
            return Ok(());
        }

        // The observer went away without ever confirming. The transaction is
        // not known failed, so the state machine stays in pending-confirmation.
        Err(SignerError::Watch {
            hash,
            reason: "receipt stream ended before confirmation".to_string(),
        }
        .into())
    }

    /// Submit and then wait for confirmation.
    pub async fn run(&mut self) -> Result<String, Error> {
        let hash = self.submit().await?;
        self.await_confirmation().await?;
        Ok(hash)
    }

    async fn mark_confirmed(&mut self, hash: &str) {
        self.state.confirming = false;
        self.state.confirmed = true;

        // Tracked separately from `confirmed`: re-observation must never
        // produce a second envelope.
        if self.confirmation_relayed {
            return;
        }
        self.confirmation_relayed = true;

        info!(%hash, "transaction confirmed");
        let envelope = TransactionConfirmedEnvelope::new(hash, self.request.clone());
        self.relay_milestone("transaction_confirmed", envelope.to_wire()).await;
        host::try_alert(
            self.dialog.as_ref(),
            "Transaction Complete",
            "The transaction was confirmed on-chain.",
        )
        .await;
    }

    /// Fire-and-forget milestone delivery. A transfer already accepted by
    /// the wallet is in flight no matter what the relay does, so a lost
    /// milestone is logged, never turned into a flow failure.
    async fn relay_milestone(
        &self,
        label: &'static str,
        wire: Result<String, RelayError>,
    ) {
        match wire {
            Ok(payload) => {
                if let Err(err) = self.relay.send(&payload).await {
                    error!(%err, label, "failed to relay milestone");
                }
            }
            Err(err) => error!(%err, label, "failed to encode milestone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::host::NoopDialog;
    use crate::signer::{ReceiptStream, WalletSession};

    struct RecordingRelay {
        available: bool,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingRelay {
        fn new(available: bool) -> Self {
            Self {
                available,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
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

    /// Scripted wallet: fixed hash or failure, duplicate confirmations.
    struct ScriptedSigner {
        hash: Option<String>,
        submitted: AtomicBool,
        confirmations: Vec<bool>,
    }

    impl ScriptedSigner {
        fn confirming(hash: &str, confirmations: Vec<bool>) -> Self {
            Self {
                hash: Some(hash.to_string()),
                submitted: AtomicBool::new(false),
                confirmations,
            }
        }

        fn rejecting() -> Self {
            Self {
                hash: None,
                submitted: AtomicBool::new(false),
                confirmations: Vec::new(),
            }
        }

        fn was_submitted(&self) -> bool {
            self.submitted.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WalletSigner for ScriptedSigner {
        fn session(&self) -> Option<WalletSession> {
            Some(WalletSession {
                address: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
                chain_id: 1,
            })
        }

        async fn sign_message(&self, _message: &str) -> Result<String, SignerError> {
            Err(SignerError::Rejected {
                reason: "not used here".to_string(),
            })
        }

        async fn send_transaction(
            &self,
            _submission: &TransactionSubmission,
        ) -> Result<String, SignerError> {
            self.submitted.store(true, Ordering::SeqCst);
            self.hash.clone().ok_or(SignerError::Submission {
                reason: "insufficient funds".to_string(),
            })
        }

        async fn watch_receipt(&self, _tx_hash: &str) -> Result<ReceiptStream, SignerError> {
            Ok(Box::pin(tokio_stream::iter(self.confirmations.clone())))
        }
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            to: "0x742d35Cc6537C0532925a3b8C17Eb02b80D4E4AE".to_string(),
            value: "0.001".to_string(),
            data: None,
            chain_id: Some(1),
            description: None,
        }
    }

    #[tokio::test]
    async fn submit_then_confirm_relays_both_milestones() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![false, true]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            Arc::clone(&relay),
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        let hash = flow.submit().await.unwrap();
        assert_eq!(hash, "0xdead");
        assert_eq!(flow.phase(), TxPhase::PendingConfirmation);
        assert!(flow.state().is_confirming());

        flow.await_confirmation().await.unwrap();
        assert_eq!(flow.phase(), TxPhase::Confirmed);
        assert!(!flow.state().is_confirming());

        let sent = relay.sent();
        assert_eq!(sent.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(first["action"], "transaction_sent");
        assert_eq!(first["status"], "pending");
        assert_eq!(second["action"], "transaction_confirmed");
        assert_eq!(second["status"], "confirmed");
        assert_eq!(first["txHash"], second["txHash"]);
    }

    #[tokio::test]
    async fn duplicate_confirmations_relay_exactly_once() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![true, true, true]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            Arc::clone(&relay),
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        flow.submit().await.unwrap();
        flow.await_confirmation().await.unwrap();
        // External re-renders re-enter the observation path.
        flow.await_confirmation().await.unwrap();
        flow.await_confirmation().await.unwrap();

        let confirmed: Vec<_> = relay
            .sent()
            .into_iter()
            .filter(|payload| payload.contains("transaction_confirmed"))
            .collect();
        assert_eq!(confirmed.len(), 1);
    }

    #[tokio::test]
    async fn submission_failure_relays_failed_envelope() {
        let signer = Arc::new(ScriptedSigner::rejecting());
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            Arc::clone(&relay),
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, Error::Signer(SignerError::Submission { .. })));
        assert_eq!(flow.phase(), TxPhase::Failed);
        assert!(!flow.state().is_processing());

        let sent = relay.sent();
        assert_eq!(sent.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(value["action"], "transaction_failed");
        assert!(value["error"].as_str().unwrap().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn relay_unavailable_fails_before_the_wallet_is_touched() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![true]));
        let relay = Arc::new(RecordingRelay::new(false));
        let mut flow = TransactionFlowController::new(
            Arc::clone(&signer),
            Arc::clone(&relay),
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, Error::Relay(RelayError::Unavailable)));
        assert_eq!(flow.phase(), TxPhase::Failed);
        assert!(!signer.was_submitted());
        assert!(relay.sent().is_empty());
    }

    #[tokio::test]
    async fn second_submission_attempt_is_rejected() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![true]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            relay,
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        flow.submit().await.unwrap();
        let err = flow.submit().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionFlowError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn invalid_requests_never_build_a_controller() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![true]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut bad = request();
        bad.to = "not-an-address".to_string();

        let err = TransactionFlowController::new(signer, relay, Arc::new(NoopDialog), bad)
            .err()
            .expect("validation must fail");
        assert!(matches!(err, Error::Launch(_)));
    }

    #[tokio::test]
    async fn confirmation_without_submission_is_an_error() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![true]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            relay,
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        let err = flow.await_confirmation().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionFlowError::NothingToConfirm)
        ));
    }

    #[tokio::test]
    async fn stream_ending_without_confirmation_keeps_state_pending() {
        let signer = Arc::new(ScriptedSigner::confirming("0xdead", vec![false]));
        let relay = Arc::new(RecordingRelay::new(true));
        let mut flow = TransactionFlowController::new(
            signer,
            Arc::clone(&relay),
            Arc::new(NoopDialog),
            request(),
        )
        .unwrap();

        flow.submit().await.unwrap();
        let err = flow.await_confirmation().await.unwrap_err();
        assert!(matches!(err, Error::Signer(SignerError::Watch { .. })));
        assert_eq!(flow.phase(), TxPhase::PendingConfirmation);
        assert!(!flow.state().is_confirmed());
    }
}
