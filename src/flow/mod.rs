//! Flow controllers.
//!
//! Each controller owns the state of exactly one flow attempt. Flow-fatal
//! errors are terminal: recovery means discarding the controller and
//! starting a fresh instance with fresh inputs, never resuming mid-flow.

pub mod auth;
pub mod sign;
pub mod transaction;

pub use auth::{AuthFlowController, AuthProgress, AuthState, AuthStep};
pub use sign::MessageSignFlow;
pub use transaction::{TransactionFlowController, TransactionState, TxPhase};
