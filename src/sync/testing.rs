//! In-memory store and submitter used by the synchronizer tests.

use crate::campaign::{Address, Campaign};
use crate::store::{
	CampaignStore, RawCampaignColumns, RawDonators, StoreConnection, StoreConnector, StoreError,
};
use crate::sync::events::{NoticeDispatcher, NoticeLog};
use crate::sync::{FixedClock, SyncContext};
use crate::transaction::{DonateMutation, LifecycleStream, TransactionSubmitter, TxLifecycle};

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub(crate) fn test_now() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Store whose responses are set by the test.
#[derive(Default)]
pub(crate) struct MockStore {
	campaigns: Mutex<Option<Result<RawCampaignColumns, String>>>,
	donators: Mutex<HashMap<u64, Result<RawDonators, String>>>,
	campaign_calls: Mutex<usize>,
	donator_calls: Mutex<HashMap<u64, usize>>,
}

impl MockStore {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub(crate) fn set_campaigns(&self, response: Result<RawCampaignColumns, String>) {
		*self.campaigns.lock().unwrap() = Some(response);
	}

	pub(crate) fn set_donators(&self, campaign_id: u64, response: Result<RawDonators, String>) {
		self.donators.lock().unwrap().insert(campaign_id, response);
	}

	pub(crate) fn campaign_calls(&self) -> usize {
		*self.campaign_calls.lock().unwrap()
	}

	pub(crate) fn donator_calls(&self, campaign_id: u64) -> usize {
		self.donator_calls
			.lock()
			.unwrap()
			.get(&campaign_id)
			.copied()
			.unwrap_or(0)
	}
}

fn rpc_error(message: String) -> StoreError {
	StoreError::RpcError {
		code: -32000,
		message,
	}
}

#[async_trait::async_trait]
impl CampaignStore for MockStore {
	async fn get_all_campaigns(&self) -> Result<RawCampaignColumns, StoreError> {
		*self.campaign_calls.lock().unwrap() += 1;
		match self.campaigns.lock().unwrap().clone() {
			Some(response) => response.map_err(rpc_error),
			None => Err(StoreError::NoData),
		}
	}

	async fn get_donators(&self, campaign_id: u64) -> Result<RawDonators, StoreError> {
		*self
			.donator_calls
			.lock()
			.unwrap()
			.entry(campaign_id)
			.or_default() += 1;
		match self.donators.lock().unwrap().get(&campaign_id).cloned() {
			Some(response) => response.map_err(rpc_error),
			None => Err(StoreError::NoData),
		}
	}
}

/// Submitter that replays lifecycle events pushed by the test.
pub(crate) struct ScriptedSubmitter {
	events: Mutex<Option<mpsc::UnboundedReceiver<TxLifecycle>>>,
	pub(crate) submitted: Mutex<Vec<DonateMutation>>,
}

impl ScriptedSubmitter {
	pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedSender<TxLifecycle>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let submitter = Arc::new(Self {
			events: Mutex::new(Some(rx)),
			submitted: Mutex::new(Vec::new()),
		});
		(submitter, tx)
	}
}

impl TransactionSubmitter for ScriptedSubmitter {
	fn submit(&self, mutation: DonateMutation) -> LifecycleStream {
		self.submitted.lock().unwrap().push(mutation);
		let rx = self.events.lock().unwrap().take();
		Box::pin(futures::stream::unfold(rx, |rx| async move {
			let mut rx = rx?;
			let event = rx.recv().await?;
			Some((event, Some(rx)))
		}))
	}
}

fn build_context(
	connection: StoreConnection,
	submitter: Arc<dyn TransactionSubmitter>,
) -> (SyncContext, Arc<NoticeLog>) {
	let log = Arc::new(NoticeLog::new());
	let mut notices = NoticeDispatcher::new();
	notices.register_handler(log.clone());
	let ctx = SyncContext::new(connection, submitter, notices)
		.with_clock(Arc::new(FixedClock(test_now())));
	(ctx, log)
}

fn connection_for(store: Option<Arc<MockStore>>) -> StoreConnection {
	match store {
		Some(store) => StoreConnection::ready(store),
		None => StoreConnection::pending().1,
	}
}

/// Context with an optional connected store and a submitter that never reports anything.
pub(crate) fn context_with(store: Option<Arc<MockStore>>) -> (SyncContext, Arc<NoticeLog>) {
	let (submitter, _) = ScriptedSubmitter::new();
	build_context(connection_for(store), submitter)
}

pub(crate) fn context_with_submitter(
	store: Option<Arc<MockStore>>,
	submitter: Arc<ScriptedSubmitter>,
) -> (SyncContext, Arc<NoticeLog>) {
	build_context(connection_for(store), submitter)
}

/// Context whose store connection is established later through the returned connector.
pub(crate) fn pending_context() -> (StoreConnector, SyncContext, Arc<NoticeLog>) {
	let (connector, connection) = StoreConnection::pending();
	let (submitter, _) = ScriptedSubmitter::new();
	let (ctx, log) = build_context(connection, submitter);
	(connector, ctx, log)
}

/// `n` campaigns whose fields are all distinguishable by index.
pub(crate) fn sample_columns(n: usize) -> RawCampaignColumns {
	let base = test_now().timestamp_millis() as u128;
	RawCampaignColumns {
		owners: (0..n).map(|i| Address::new(format!("0x{:040x}", i + 1))).collect(),
		titles: (0..n).map(|i| format!("Campaign {}", i)).collect(),
		descriptions: (0..n).map(|i| format!("Description {}", i)).collect(),
		targets: (0..n).map(|i| 100 * (i as u128 + 1)).collect(),
		deadlines: (0..n).map(|i| base + 86_400_000 * i as u128).collect(),
		amount_collecteds: (0..n).map(|i| 7 * i as u128).collect(),
		images: (0..n).map(|i| format!("https://img/{}.png", i)).collect(),
	}
}

/// A campaign whose deadline is `days` days from the test clock.
pub(crate) fn sample_campaign(id: u64, target: u128, amount_collected: u128, days: i64) -> Campaign {
	Campaign {
		id,
		owner: Address::new("0x0"),
		title: format!("Campaign {}", id),
		description: "Description".to_string(),
		image: "https://img".to_string(),
		target,
		deadline: test_now() + Duration::days(days),
		amount_collected,
	}
}
