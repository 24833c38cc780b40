//!
//! Transaction sender for the campaign contract.
//!
//! Submits donate transactions through `eth_sendTransaction` on a node that manages the donor
//! account, then polls `eth_getTransactionReceipt` until the transaction is included or the
//! confirmation timeout expires.

use crate::campaign::Address;
use crate::store::{JsonRpcClient, StoreError};
use crate::transaction::builder::DonateTransactionBuilder;
use crate::transaction::{
	DonateMutation, LifecycleStream, SubmissionError, TransactionSubmitter, TxLifecycle, TxRef,
};

use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Transaction sender for submitting donations through a JSON-RPC node
#[derive(Clone)]
pub struct JsonRpcSubmitter {
	rpc: JsonRpcClient,
	contract: Address,
	poll_interval: Duration,
	confirmation_timeout: Duration,
}

/// Where a submission is in its lifecycle.
enum Phase {
	Send(DonateMutation),
	AwaitReceipt { hash: String, deadline: Instant },
	Done,
}

impl JsonRpcSubmitter {
	/// Creates a new transaction sender
	pub fn new(
		rpc: JsonRpcClient,
		contract: Address,
		poll_interval: Duration,
		confirmation_timeout: Duration,
	) -> Self {
		Self {
			rpc,
			contract,
			poll_interval,
			confirmation_timeout,
		}
	}

	/// Builds and sends the transaction, returning its hash without waiting for inclusion
	async fn send_tx_no_wait(&self, mutation: DonateMutation) -> Result<String, SubmissionError> {
		let request = DonateTransactionBuilder::new()
			.with_contract(self.contract.clone())
			.with_mutation(mutation)
			.build()?;

		debug!("SENDING {:?}", request);
		let result = self
			.rpc
			.call("eth_sendTransaction", json!([request]))
			.await?;
		let hash = result
			.as_str()
			.ok_or(SubmissionError::Rpc(StoreError::NoData))?
			.to_string();
		debug!("SENT {}", hash);
		Ok(hash)
	}

	/// Polls for the receipt until it shows up or `deadline` passes
	async fn wait_for_receipt(&self, hash: &str, deadline: Instant) -> Result<(), SubmissionError> {
		loop {
			match self
				.rpc
				.call("eth_getTransactionReceipt", json!([hash]))
				.await
			{
				Ok(receipt) => {
					let status = receipt.get("status").and_then(|s| s.as_str());
					return match status {
						Some("0x1") => Ok(()),
						_ => {
							error!("Transaction {} failed with status {:?}", hash, status);
							Err(SubmissionError::Reverted(hash.to_string()))
						}
					};
				}
				// A null receipt means the transaction is still pending.
				Err(StoreError::NoData) => {}
				Err(e) => warn!("Receipt query for {} failed: {}", hash, e),
			}

			if Instant::now() + self.poll_interval > deadline {
				return Err(SubmissionError::Timeout(
					hash.to_string(),
					self.confirmation_timeout.as_secs(),
				));
			}
			tokio::time::sleep(self.poll_interval).await;
		}
	}
}

impl TransactionSubmitter for JsonRpcSubmitter {
	fn submit(&self, mutation: DonateMutation) -> LifecycleStream {
		let sender = self.clone();
		let stream = futures::stream::unfold(Phase::Send(mutation), move |phase| {
			let sender = sender.clone();
			async move {
				match phase {
					Phase::Send(mutation) => match sender.send_tx_no_wait(mutation).await {
						Ok(hash) => {
							let deadline = Instant::now() + sender.confirmation_timeout;
							let event = TxLifecycle::Sent(TxRef(hash.clone()));
							Some((event, Phase::AwaitReceipt { hash, deadline }))
						}
						Err(e) => {
							error!("Failed to submit donation: {}", e);
							Some((TxLifecycle::Failed(e.to_string()), Phase::Done))
						}
					},
					Phase::AwaitReceipt { hash, deadline } => {
						match sender.wait_for_receipt(&hash, deadline).await {
							Ok(()) => {
								info!("Transaction {} confirmed", hash);
								Some((TxLifecycle::Confirmed(TxRef(hash)), Phase::Done))
							}
							Err(e) => Some((TxLifecycle::Failed(e.to_string()), Phase::Done)),
						}
					}
					Phase::Done => None,
				}
			}
		});

		Box::pin(stream)
	}
}
