//! Observable read queries and the settlement guard.
//!
//! A [`ReadQuery`] wraps one store read. Issuing it moves the query to `InFlight`; when the read
//! resolves the query becomes `Settled` with an incremented generation and the outcome attached.
//! Synchronizers subscribe to these transitions and use a [`SettlementGuard`] so each settlement
//! is projected into view state at most once.
//!
//! Reads run on spawned tasks holding only a weak reference to their query. If the owning view
//! is torn down before the read resolves, the result is discarded.

use crate::store::StoreError;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Identity of a read query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
	AllCampaigns,
	Donators(u64),
}

/// Where a query is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
	/// Never issued.
	Idle,
	InFlight,
	Settled,
}

/// Observable state of a query.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
	pub status: QueryStatus,
	/// Number of settlements so far.
	pub generation: u64,
	/// Outcome of the latest settlement.
	pub outcome: Option<Result<T, String>>,
}

impl<T> Default for QuerySnapshot<T> {
	fn default() -> Self {
		Self {
			status: QueryStatus::Idle,
			generation: 0,
			outcome: None,
		}
	}
}

/// A store read with an observable in-flight/settled lifecycle
pub struct ReadQuery<T> {
	key: QueryKey,
	state: watch::Sender<QuerySnapshot<T>>,
}

impl<T> ReadQuery<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new(key: QueryKey) -> Arc<Self> {
		let (state, _) = watch::channel(QuerySnapshot::default());
		Arc::new(Self { key, state })
	}

	pub fn key(&self) -> &QueryKey {
		&self.key
	}

	pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<T>> {
		self.state.subscribe()
	}

	pub fn snapshot(&self) -> QuerySnapshot<T> {
		self.state.borrow().clone()
	}

	pub fn is_in_flight(&self) -> bool {
		self.state.borrow().status == QueryStatus::InFlight
	}

	/// Issue the read on a spawned task.
	///
	/// Returns `false` without issuing anything when a read for this query is already in flight.
	pub fn fetch<F>(self: &Arc<Self>, read: F) -> bool
	where
		F: Future<Output = Result<T, StoreError>> + Send + 'static,
	{
		if self.is_in_flight() {
			debug!("Query {:?} already in flight, not issuing another", self.key);
			return false;
		}

		self.state
			.send_modify(|state| state.status = QueryStatus::InFlight);
		debug!("Issued query {:?}", self.key);

		let query = Arc::downgrade(self);
		let key = self.key.clone();
		tokio::spawn(async move {
			let outcome = read.await.map_err(|e| e.to_string());
			match query.upgrade() {
				Some(query) => query.settle(outcome),
				None => debug!("Discarding result of {:?}: view was torn down", key),
			}
		});

		true
	}

	fn settle(&self, outcome: Result<T, String>) {
		self.state.send_modify(|state| {
			state.status = QueryStatus::Settled;
			state.generation += 1;
			state.outcome = Some(outcome);
		});
		debug!(
			"Query {:?} settled (generation {})",
			self.key,
			self.state.borrow().generation
		);
	}
}

/// Ensures each (query, generation) settlement is processed once, and only while connected
#[derive(Debug, Default)]
pub struct SettlementGuard {
	processed: Option<(QueryKey, u64)>,
}

impl SettlementGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if the caller should project this snapshot, and records it as processed.
	pub fn should_process<T>(
		&mut self,
		key: &QueryKey,
		snapshot: &QuerySnapshot<T>,
		connected: bool,
	) -> bool {
		if !connected {
			debug!("Store connection unavailable, skipping {:?}", key);
			return false;
		}
		if snapshot.status != QueryStatus::Settled {
			return false;
		}
		if let Some((processed_key, generation)) = &self.processed {
			if processed_key == key && *generation == snapshot.generation {
				debug!(
					"Settlement {} of {:?} already processed",
					generation, key
				);
				return false;
			}
		}

		self.processed = Some((key.clone(), snapshot.generation));
		true
	}
}
