//!
//! JSON-RPC client for the campaign contract.
//!
//! This module provides an async client that reads the campaign contract through `eth_call` and
//! decodes the ABI-encoded results into the raw column types. The same RPC transport is shared
//! with the transaction submitter. All methods are async and designed for use with Tokio.

use super::abi;
use super::types::*;
use super::CampaignStore;
use crate::campaign::Address;

use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// JSON-RPC transport over HTTP
#[derive(Clone)]
pub struct JsonRpcClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// The node's JSON-RPC endpoint.
	rpc_url: String,
	/// Request id counter, shared between clones.
	next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
	/// Create a new JSON-RPC client.
	///
	/// # Arguments
	/// * `rpc_url` - The HTTP endpoint of the node.
	/// * `timeout` - Per-request timeout.
	pub fn new(rpc_url: String, timeout: Duration) -> Result<Self, StoreError> {
		let http_client = Client::builder().timeout(timeout).build()?;

		Ok(Self {
			http_client,
			rpc_url,
			next_id: Arc::new(AtomicU64::new(1)),
		})
	}

	pub fn url(&self) -> &str {
		&self.rpc_url
	}

	/// Execute a JSON-RPC call.
	///
	/// # Arguments
	/// * `method` - The RPC method name.
	/// * `params` - Positional parameters.
	///
	/// # Returns
	/// The `result` member of the response, or a `StoreError` if the request fails or the node
	/// returns an error object.
	pub async fn call(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<serde_json::Value, StoreError> {
		let request = RpcRequest {
			jsonrpc: "2.0",
			id: self.next_id.fetch_add(1, Ordering::Relaxed),
			method,
			params,
		};

		debug!("RPC {} -> {}", method, self.rpc_url);

		let response = self
			.http_client
			.post(&self.rpc_url)
			.header("Content-Type", "application/json")
			.json(&request)
			.send()
			.await?
			.error_for_status()?;

		let response: RpcResponse = response.json().await?;

		if let Some(error) = response.error {
			return Err(StoreError::RpcError {
				code: error.code,
				message: error.message,
			});
		}

		response.result.ok_or(StoreError::NoData)
	}
}

/// Campaign store backed by `eth_call` against the deployed contract
#[derive(Clone)]
pub struct JsonRpcCampaignStore {
	rpc: JsonRpcClient,
	contract: Address,
}

impl JsonRpcCampaignStore {
	pub fn new(rpc: JsonRpcClient, contract: Address) -> Self {
		info!("Campaign store using contract {} at {}", contract, rpc.url());
		Self { rpc, contract }
	}

	/// Run a read-only call against the contract and return the raw return data.
	async fn eth_call(&self, data: Vec<u8>) -> Result<Vec<u8>, StoreError> {
		let params = json!([
			{
				"to": self.contract.as_str(),
				"data": format!("0x{}", hex::encode(data)),
			},
			"latest"
		]);

		let result = self.rpc.call("eth_call", params).await?;
		let encoded = result.as_str().ok_or(StoreError::NoData)?;
		let bytes = hex::decode(encoded.trim_start_matches("0x"))?;
		debug!("eth_call returned {} bytes", bytes.len());
		Ok(bytes)
	}
}

#[async_trait::async_trait]
impl CampaignStore for JsonRpcCampaignStore {
	async fn get_all_campaigns(&self) -> Result<RawCampaignColumns, StoreError> {
		let data = self
			.eth_call(abi::get_all_campaigns_call())
			.await?;
		abi::decode_campaign_columns(&data)
	}

	async fn get_donators(&self, campaign_id: u64) -> Result<RawDonators, StoreError> {
		let data = self.eth_call(abi::get_donators_call(campaign_id)).await?;
		abi::decode_donators(&data)
	}
}
