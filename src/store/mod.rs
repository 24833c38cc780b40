//! Remote campaign store integration
//!
//! This module defines the read interface the synchronizers consume, the connection handle they
//! share, and a JSON-RPC adapter that reads the campaign contract through a node.

/// Contract ABI encoding and decoding
pub mod abi;
/// JSON-RPC client for the campaign contract
mod client;
/// Type definitions for store results and errors
mod types;

pub use client::{JsonRpcCampaignStore, JsonRpcClient};
pub use types::*;

use std::sync::Arc;
use tokio::sync::watch;

/// Read queries exposed by the campaign contract.
#[async_trait::async_trait]
pub trait CampaignStore: Send + Sync {
	/// Fetch every campaign as seven index-aligned columns.
	async fn get_all_campaigns(&self) -> Result<RawCampaignColumns, StoreError>;

	/// Fetch the donors and donation amounts of one campaign.
	async fn get_donators(&self, campaign_id: u64) -> Result<RawDonators, StoreError>;
}

/// Process-wide handle to the store connection.
///
/// The connection may not be established yet at startup; readers see `None` until it is.
/// Synchronizers only read it and can wait for it to change.
#[derive(Clone)]
pub struct StoreConnection {
	rx: watch::Receiver<Option<Arc<dyn CampaignStore>>>,
}

/// Owner side of a [`StoreConnection`], used to publish the store once it is ready.
pub struct StoreConnector {
	tx: watch::Sender<Option<Arc<dyn CampaignStore>>>,
}

impl StoreConnection {
	/// A connection that starts out unavailable, with the handle used to establish it later.
	pub fn pending() -> (StoreConnector, StoreConnection) {
		let (tx, rx) = watch::channel(None);
		(StoreConnector { tx }, StoreConnection { rx })
	}

	/// A connection that is already established.
	pub fn ready(store: Arc<dyn CampaignStore>) -> StoreConnection {
		let (_, rx) = watch::channel(Some(store));
		StoreConnection { rx }
	}

	/// The store, if connected.
	pub fn current(&self) -> Option<Arc<dyn CampaignStore>> {
		self.rx.borrow().clone()
	}

	pub fn is_connected(&self) -> bool {
		self.rx.borrow().is_some()
	}

	/// Wait until the connection changes. Returns `false` once the connection can no longer change.
	pub async fn changed(&mut self) -> bool {
		self.rx.changed().await.is_ok()
	}
}

impl StoreConnector {
	pub fn connect(&self, store: Arc<dyn CampaignStore>) {
		self.tx.send_replace(Some(store));
	}
}
