//! Donation submission
//!
//! The synchronizer hands a [`DonateMutation`] to a [`TransactionSubmitter`] and reacts to the
//! lifecycle events it reports. The JSON-RPC submitter sends through a node-managed account and
//! polls for the receipt.

/// Transaction builder for donate calls
pub mod builder;
/// JSON-RPC transaction submitter
pub mod sender;

use crate::campaign::Address;
use crate::store::StoreError;
use crate::utils::AmountError;

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// A donate call, parameterized the way the front-end collects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonateMutation {
	pub campaign_id: u64,
	/// Amount as entered by the user, in whole currency units (e.g. `"0.5"`).
	pub amount: String,
	pub donor: Address,
	pub owner: Address,
}

/// Reference to a submitted transaction (its hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(pub String);

impl fmt::Display for TxRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Events reported while a submission progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxLifecycle {
	/// The transaction was accepted by the node.
	Sent(TxRef),
	/// The transaction was included and succeeded.
	Confirmed(TxRef),
	/// The attempt failed. Terminal; nothing is retried.
	Failed(String),
}

/// Stream of lifecycle events for one submission.
pub type LifecycleStream = Pin<Box<dyn Stream<Item = TxLifecycle> + Send>>;

/// Signs and submits donate mutations.
pub trait TransactionSubmitter: Send + Sync {
	/// Start a submission. The returned stream ends after a terminal event.
	fn submit(&self, mutation: DonateMutation) -> LifecycleStream;
}

/// Errors raised while building or sending a transaction
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
	#[error("Invalid amount: {0}")]
	InvalidAmount(#[from] AmountError),

	#[error("Missing transaction field: {0}")]
	MissingField(&'static str),

	#[error("RPC error: {0}")]
	Rpc(#[from] StoreError),

	#[error("Transaction {0} reverted")]
	Reverted(String),

	#[error("Transaction {0} not confirmed within {1} seconds")]
	Timeout(String, u64),
}
