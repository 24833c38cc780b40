//! Types for reads against the campaign contract

use crate::campaign::Address;

use serde::{Deserialize, Serialize};

/// Column-oriented result of `getAllCampaigns()`.
///
/// The contract returns seven parallel sequences, one entry per campaign, aligned by index.
/// Row projection happens in the synchronizer, which also checks the lengths agree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCampaignColumns {
    /// Campaign owners.
    pub owners: Vec<Address>,
    /// Campaign titles.
    pub titles: Vec<String>,
    /// Campaign descriptions.
    pub descriptions: Vec<String>,
    /// Funding targets in base units.
    pub targets: Vec<u128>,
    /// Deadlines as unix timestamps (seconds).
    pub deadlines: Vec<u128>,
    /// Amounts collected so far in base units.
    pub amount_collecteds: Vec<u128>,
    /// Image references.
    pub images: Vec<String>,
}

/// Result of `getDonators(uint256)`: two parallel sequences aligned by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDonators {
    /// Donor identities.
    pub donors: Vec<Address>,
    /// Donation amounts in base units.
    pub amounts: Vec<u128>,
}

/// JSON-RPC request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Error types for store reads
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("RPC error {code}: {message}")]
    RpcError { code: i64, message: String },

    #[error("No data returned")]
    NoData,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("ABI decode error: {0}")]
    AbiError(#[from] alloy_sol_types::Error),

    #[error("Value {0} does not fit in 128 bits")]
    ValueOutOfRange(String),
}
