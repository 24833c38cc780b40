use crate::store::{StoreConnection, StoreError};
use crate::sync::events::NoticeDispatcher;
use crate::transaction::TransactionSubmitter;

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types surfaced by the synchronizers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
	#[error("Query failure: {0}")]
	QueryFailure(String),

	#[error("Submission failure: {0}")]
	SubmissionFailure(String),

	#[error("Store connection is not available")]
	DependencyUnavailable,
}

impl From<StoreError> for SyncError {
	fn from(e: StoreError) -> Self {
		SyncError::QueryFailure(e.to_string())
	}
}

/// Result of applying a settled read to view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
	/// The settled payload was projected and published.
	Applied,
	/// Nothing to do: not connected, still in flight, or this settlement was already handled.
	Skipped,
	/// The read or its projection failed; the previous view state was kept.
	Failed(SyncError),
}

/// Source of the current time for derived fields.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
	fn now(&self) -> DateTime<Utc> {
		self.0
	}
}

/// Everything a synchronizer needs from the outside world, passed in at construction.
#[derive(Clone)]
pub struct SyncContext {
	pub connection: StoreConnection,
	pub submitter: Arc<dyn TransactionSubmitter>,
	pub notices: NoticeDispatcher,
	pub clock: Arc<dyn Clock>,
}

impl SyncContext {
	pub fn new(
		connection: StoreConnection,
		submitter: Arc<dyn TransactionSubmitter>,
		notices: NoticeDispatcher,
	) -> Self {
		Self {
			connection,
			submitter,
			notices,
			clock: Arc::new(SystemClock),
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}
}
