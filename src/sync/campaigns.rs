//! Campaign list synchronizer.
//!
//! Fetches every campaign and publishes them as a display-ready list. The list is only replaced
//! by a successful, well-formed read; a failed read raises a notice and keeps the previous list.

use crate::campaign::{Campaign, FetchState};
use crate::store::RawCampaignColumns;
use crate::sync::{
	LoadOutcome, SyncContext, SyncError,
	events::Notice,
	query::{QueryKey, QuerySnapshot, QueryStatus, ReadQuery, SettlementGuard},
};

use chrono::{DateTime, Utc};
use itertools::izip;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Campaign list as published to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignListView {
	pub campaigns: Vec<Campaign>,
	pub is_loading: bool,
	pub fetch: FetchState,
}

pub struct CampaignListSynchronizer {
	ctx: SyncContext,
	query: Arc<ReadQuery<RawCampaignColumns>>,
	guard: Mutex<SettlementGuard>,
	view: watch::Sender<CampaignListView>,
}

impl CampaignListSynchronizer {
	pub fn new(ctx: SyncContext) -> Self {
		let query = ReadQuery::new(QueryKey::AllCampaigns);
		let (view, _) = watch::channel(CampaignListView::default());

		Self {
			ctx,
			query,
			guard: Mutex::new(SettlementGuard::new()),
			view,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<CampaignListView> {
		self.view.subscribe()
	}

	pub fn view(&self) -> CampaignListView {
		self.view.borrow().clone()
	}

	/// Issue the campaigns read if the store is connected.
	pub fn mount(&self) {
		match self.issue_query() {
			Ok(_) => {}
			Err(SyncError::DependencyUnavailable) => {
				debug!("Campaign list mounted before the store connection is ready")
			}
			Err(e) => warn!("Failed to issue campaigns query: {}", e),
		}
	}

	fn issue_query(&self) -> Result<bool, SyncError> {
		let store = self
			.ctx
			.connection
			.current()
			.ok_or(SyncError::DependencyUnavailable)?;

		let issued = self
			.query
			.fetch(async move { store.get_all_campaigns().await });
		if issued {
			self.view.send_modify(|view| {
				view.is_loading = true;
				view.fetch = FetchState::Loading;
			});
		}
		Ok(issued)
	}

	/// Project the latest settlement of the campaigns read into the published list.
	///
	/// Runs at most once per settlement and only while the store is connected.
	pub async fn load(&self) -> LoadOutcome {
		let snapshot = self.query.snapshot();
		if !self.should_process(&snapshot) {
			return LoadOutcome::Skipped;
		}

		let projected = match snapshot.outcome {
			Some(Ok(raw)) => project_campaigns(&raw),
			Some(Err(cause)) => Err(SyncError::QueryFailure(cause)),
			None => Err(SyncError::QueryFailure("query settled without a result".to_string())),
		};

		match projected {
			Ok(campaigns) => {
				info!("Loaded {} campaigns", campaigns.len());
				self.view.send_modify(|view| {
					view.campaigns = campaigns;
					view.is_loading = false;
					view.fetch = FetchState::Idle;
				});
				LoadOutcome::Applied
			}
			Err(e) => {
				warn!("Failed to fetch campaigns: {}", e);
				let cause = match &e {
					SyncError::QueryFailure(cause) => cause.clone(),
					other => other.to_string(),
				};
				self.ctx
					.notices
					.dispatch(Notice::error(format!("Failed to fetch campaigns: {}", cause)))
					.await;
				self.view.send_modify(|view| {
					view.is_loading = false;
					view.fetch = FetchState::Error(cause);
				});
				LoadOutcome::Failed(e)
			}
		}
	}

	fn should_process(&self, snapshot: &QuerySnapshot<RawCampaignColumns>) -> bool {
		let connected = self.ctx.connection.is_connected();
		self.guard
			.lock()
			.unwrap_or_else(|p| p.into_inner())
			.should_process(self.query.key(), snapshot, connected)
	}

	/// Issue a fresh read, wait for it to settle, and apply it.
	pub async fn refresh(&self) -> LoadOutcome {
		let before = self.query.snapshot().generation;
		if let Err(e) = self.issue_query() {
			debug!("Skipping campaigns refresh: {}", e);
			return LoadOutcome::Skipped;
		}

		if self
			.query
			.subscribe()
			.wait_for(|s| s.status == QueryStatus::Settled && s.generation > before)
			.await
			.is_err()
		{
			return LoadOutcome::Skipped;
		}

		self.load().await
	}

	/// React to settlements and to the store connection coming up until the view is dropped.
	pub async fn run(&self) {
		let mut query_rx = self.query.subscribe();
		let mut connection = self.ctx.connection.clone();
		let mut watch_connection = true;

		self.mount();

		loop {
			tokio::select! {
				changed = query_rx.changed() => {
					if changed.is_err() {
						break;
					}
					self.load().await;
				}
				still_open = connection.changed(), if watch_connection => {
					if !still_open {
						watch_connection = false;
						continue;
					}
					if connection.is_connected() {
						info!("Store connection ready, loading campaigns");
						self.mount();
						self.load().await;
					}
				}
			}
		}
	}
}

/// Turn the column-oriented read into one campaign per index.
pub fn project_campaigns(raw: &RawCampaignColumns) -> Result<Vec<Campaign>, SyncError> {
	let len = raw.owners.len();
	let lengths = [
		raw.titles.len(),
		raw.descriptions.len(),
		raw.targets.len(),
		raw.deadlines.len(),
		raw.amount_collecteds.len(),
		raw.images.len(),
	];
	if lengths.iter().any(|l| *l != len) {
		return Err(SyncError::QueryFailure(format!(
			"campaign columns have mismatched lengths: {} owners, others {:?}",
			len, lengths
		)));
	}

	izip!(
		&raw.owners,
		&raw.titles,
		&raw.descriptions,
		&raw.targets,
		&raw.deadlines,
		&raw.amount_collecteds,
		&raw.images
	)
	.enumerate()
	.map(
		|(index, (owner, title, description, target, deadline, amount_collected, image))| {
			Ok(Campaign {
				id: index as u64,
				owner: owner.clone(),
				title: title.clone(),
				description: description.clone(),
				image: image.clone(),
				target: *target,
				deadline: deadline_from_millis(*deadline)?,
				amount_collected: *amount_collected,
			})
		},
	)
	.collect()
}

/// Contract deadlines are unix timestamps in milliseconds.
fn deadline_from_millis(millis: u128) -> Result<DateTime<Utc>, SyncError> {
	i64::try_from(millis)
		.ok()
		.and_then(DateTime::from_timestamp_millis)
		.ok_or_else(|| SyncError::QueryFailure(format!("deadline {} is out of range", millis)))
}
