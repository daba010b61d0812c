//! Host-application capability seams.
//!
//! The host application supplies three singleton-like capabilities: a
//! one-way outbound data channel, a blocking dialog surface, and mini-app
//! lifecycle control. Each is injected into the flows at construction so
//! they stay independently testable with fakes; none is ever reached
//! through ambient globals. Availability is launch-context dependent and
//! must be probed before use.

use async_trait::async_trait;
use tracing::debug;

use crate::error::RelayError;

/// One-way outbound data channel to the host application.
///
/// Delivery is fire-and-forget and at most once per call; no response is
/// awaited and no retry is attempted.
#[async_trait]
pub trait OutboundRelay: Send + Sync {
    /// Whether the host accepts outbound payloads in this launch context.
    fn is_available(&self) -> bool;

    /// Hand one serialized payload to the host.
    async fn send(&self, payload: &str) -> Result<(), RelayError>;
}

/// Blocking dialog surface for local error and success notifications.
#[async_trait]
pub trait HostDialog: Send + Sync {
    fn is_available(&self) -> bool;

    /// Show a blocking dialog and wait for dismissal.
    async fn alert(&self, title: &str, message: &str);
}

/// Mini-app lifecycle control.
#[async_trait]
pub trait HostLifecycle: Send + Sync {
    fn close_available(&self) -> bool;

    /// Request host teardown of the mini app. No return value is observed.
    async fn close(&self);
}

/// Dialog surface that reports unavailable and drops every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialog;

#[async_trait]
impl HostDialog for NoopDialog {
    fn is_available(&self) -> bool {
        false
    }

    async fn alert(&self, _title: &str, _message: &str) {}
}

/// Lifecycle surface with no teardown capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLifecycle;

#[async_trait]
impl HostLifecycle for NoopLifecycle {
    fn close_available(&self) -> bool {
        false
    }

    async fn close(&self) {}
}

/// Show a dialog if the capability is present; otherwise drop it silently.
pub(crate) async fn try_alert<D: HostDialog + ?Sized>(dialog: &D, title: &str, message: &str) {
    if dialog.is_available() {
        dialog.alert(title, message).await;
    } else {
        debug!(title, message, "host dialog unavailable; dropping alert");
    }
}
