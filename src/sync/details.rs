//! Campaign detail and donor synchronizer.
//!
//! Holds one campaign's view state: derived fields, the donor list, and the donate-in-progress
//! flag. Donations are never appended locally; a confirmed donation triggers a fresh donor read
//! and the list changes when that read settles.

use crate::campaign::{Address, Campaign, Donation, FetchState};
use crate::store::RawDonators;
use crate::sync::{
	LoadOutcome, SyncContext, SyncError,
	events::Notice,
	query::{QueryKey, QuerySnapshot, QueryStatus, ReadQuery, SettlementGuard},
	view::{CampaignSummary, FundingPanel},
};
use crate::transaction::{DonateMutation, TxLifecycle, TxRef};

use futures_util::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Single-campaign view state as published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDetailView {
	pub campaign: Campaign,
	pub summary: CampaignSummary,
	pub donors: Vec<Donation>,
	pub donors_fetch: FetchState,
	pub donate_in_progress: bool,
}

impl CampaignDetailView {
	/// Number of backers, derived from the donor list.
	pub fn backers(&self) -> usize {
		self.donors.len()
	}

	pub fn has_donors(&self) -> bool {
		!self.donors.is_empty()
	}
}

pub struct CampaignDetailSynchronizer {
	ctx: SyncContext,
	query: Arc<ReadQuery<RawDonators>>,
	guard: Mutex<SettlementGuard>,
	view: watch::Sender<CampaignDetailView>,
	/// Submissions currently outstanding.
	submissions: AtomicUsize,
}

/// Keeps the in-progress flag set while at least one submission is outstanding.
struct InProgress<'a> {
	view: &'a watch::Sender<CampaignDetailView>,
	submissions: &'a AtomicUsize,
}

impl<'a> InProgress<'a> {
	fn begin(view: &'a watch::Sender<CampaignDetailView>, submissions: &'a AtomicUsize) -> Self {
		submissions.fetch_add(1, Ordering::SeqCst);
		view.send_modify(|view| view.donate_in_progress = true);
		Self { view, submissions }
	}
}

impl Drop for InProgress<'_> {
	fn drop(&mut self) {
		if self.submissions.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.view
				.send_modify(|view| view.donate_in_progress = false);
		}
	}
}

impl CampaignDetailSynchronizer {
	pub fn new(ctx: SyncContext, campaign: Campaign) -> Self {
		let query = ReadQuery::new(QueryKey::Donators(campaign.id));
		let summary = CampaignSummary::derive(&campaign, ctx.clock.now());
		let (view, _) = watch::channel(CampaignDetailView {
			campaign,
			summary,
			donors: Vec::new(),
			donors_fetch: FetchState::Idle,
			donate_in_progress: false,
		});

		Self {
			ctx,
			query,
			guard: Mutex::new(SettlementGuard::new()),
			view,
			submissions: AtomicUsize::new(0),
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<CampaignDetailView> {
		self.view.subscribe()
	}

	pub fn view(&self) -> CampaignDetailView {
		self.view.borrow().clone()
	}

	pub fn campaign_id(&self) -> u64 {
		self.view.borrow().campaign.id
	}

	/// Recompute the time-dependent fields against the clock.
	pub fn refresh_summary(&self) {
		let now = self.ctx.clock.now();
		self.view.send_modify(|view| {
			view.summary = CampaignSummary::derive(&view.campaign, now);
		});
	}

	/// Whether the presentation layer should offer the donate control.
	pub fn can_donate(&self) -> bool {
		let view = self.view.borrow();
		view.summary.funding == FundingPanel::Open && !view.donate_in_progress
	}

	/// Issue the donor read if the store is connected.
	pub fn mount(&self) {
		match self.issue_query() {
			Ok(_) => {}
			Err(SyncError::DependencyUnavailable) => {
				debug!("Campaign detail mounted before the store connection is ready")
			}
			Err(e) => warn!("Failed to issue donators query: {}", e),
		}
	}

	fn issue_query(&self) -> Result<bool, SyncError> {
		let store = self
			.ctx
			.connection
			.current()
			.ok_or(SyncError::DependencyUnavailable)?;

		let campaign_id = self.campaign_id();
		let issued = self
			.query
			.fetch(async move { store.get_donators(campaign_id).await });
		if issued {
			self.view
				.send_modify(|view| view.donors_fetch = FetchState::Loading);
		}
		Ok(issued)
	}

	/// Project the latest settlement of the donor read into the published donor list.
	///
	/// Runs at most once per settlement and only while the store is connected.
	pub async fn load_donors(&self) -> LoadOutcome {
		let snapshot = self.query.snapshot();
		if !self.should_process(&snapshot) {
			return LoadOutcome::Skipped;
		}

		match snapshot.outcome {
			Some(Ok(raw)) => {
				let donors = project_donations(self.campaign_id(), raw);
				info!(
					"Loaded {} donations for campaign {}",
					donors.len(),
					self.campaign_id()
				);
				self.view.send_modify(|view| {
					view.donors = donors;
					view.donors_fetch = FetchState::Idle;
				});
				LoadOutcome::Applied
			}
			outcome => {
				let cause = match outcome {
					Some(Err(cause)) => cause,
					_ => "query settled without a result".to_string(),
				};
				warn!(
					"Failed to fetch donators for campaign {}: {}",
					self.campaign_id(),
					cause
				);
				self.ctx
					.notices
					.dispatch(Notice::error(format!("Failed to fetch donators: {}", cause)))
					.await;
				self.view
					.send_modify(|view| view.donors_fetch = FetchState::Error(cause.clone()));
				LoadOutcome::Failed(SyncError::QueryFailure(cause))
			}
		}
	}

	fn should_process(&self, snapshot: &QuerySnapshot<RawDonators>) -> bool {
		let connected = self.ctx.connection.is_connected();
		self.guard
			.lock()
			.unwrap_or_else(|p| p.into_inner())
			.should_process(self.query.key(), snapshot, connected)
	}

	/// Wait for the donor read currently in flight (if any) to settle, then apply it.
	pub async fn settle_donors(&self) -> LoadOutcome {
		if self.query.is_in_flight() {
			if self
				.query
				.subscribe()
				.wait_for(|s| s.status == QueryStatus::Settled)
				.await
				.is_err()
			{
				return LoadOutcome::Skipped;
			}
		}
		self.load_donors().await
	}

	/// Issue a fresh donor read, wait for it to settle, and apply it.
	pub async fn refresh_donors(&self) -> LoadOutcome {
		if let Err(e) = self.issue_query() {
			debug!("Skipping donators refresh: {}", e);
			return LoadOutcome::Skipped;
		}
		self.settle_donors().await
	}

	/// Donate to the mounted campaign.
	///
	/// The in-progress flag is set for exactly the duration of the submission attempt, or of the
	/// longest of overlapping attempts. A confirmed donation issues a fresh donor read; the donor
	/// list changes when [`run`](Self::run) or [`settle_donors`](Self::settle_donors) applies it.
	pub async fn donate(
		&self,
		amount: &str,
		donor: Address,
		owner: Address,
	) -> Result<TxRef, SyncError> {
		if self.view.borrow().donate_in_progress {
			warn!("Donate invoked while a submission is still outstanding");
		}

		let _in_progress = InProgress::begin(&self.view, &self.submissions);
		let mutation = DonateMutation {
			campaign_id: self.campaign_id(),
			amount: amount.to_string(),
			donor,
			owner,
		};
		info!(
			"Submitting donation of {} to campaign {}",
			mutation.amount, mutation.campaign_id
		);

		let mut events = self.ctx.submitter.submit(mutation);
		while let Some(event) = events.next().await {
			match event {
				TxLifecycle::Sent(tx) => {
					info!("Donation transaction sent: {}", tx);
					self.ctx
						.notices
						.dispatch(Notice::success("Transaction submitted").with_reference(tx.0))
						.await;
				}
				TxLifecycle::Confirmed(tx) => {
					info!("Donation transaction confirmed: {}", tx);
					self.ctx
						.notices
						.dispatch(
							Notice::success("You have successfully donated to the campaign!")
								.with_reference(tx.0.clone()),
						)
						.await;
					if let Err(e) = self.issue_query() {
						debug!("Not refreshing donators after confirmation: {}", e);
					}
					return Ok(tx);
				}
				TxLifecycle::Failed(cause) => {
					warn!("Donation failed: {}", cause);
					self.ctx
						.notices
						.dispatch(Notice::warning(format!("Donation failed: {}", cause)))
						.await;
					return Err(SyncError::SubmissionFailure(cause));
				}
			}
		}

		let cause = "submission ended without confirmation".to_string();
		warn!("Donation failed: {}", cause);
		self.ctx
			.notices
			.dispatch(Notice::warning(format!("Donation failed: {}", cause)))
			.await;
		Err(SyncError::SubmissionFailure(cause))
	}

	/// React to donor read settlements and to the store connection coming up until the view is
	/// dropped.
	///
	/// Takes `&self` so [`donate`](Self::donate) can be polled alongside it.
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
					self.load_donors().await;
				}
				still_open = connection.changed(), if watch_connection => {
					if !still_open {
						watch_connection = false;
						continue;
					}
					if connection.is_connected() {
						self.mount();
						self.load_donors().await;
					}
				}
			}
		}
	}
}

/// Pair donors with amounts index by index.
pub fn project_donations(campaign_id: u64, raw: RawDonators) -> Vec<Donation> {
	raw.donors
		.into_iter()
		.zip(raw.amounts)
		.map(|(donor, amount)| Donation {
			campaign_id,
			donor,
			amount,
		})
		.collect()
}
