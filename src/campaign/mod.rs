//! Campaign domain records as projected from the remote store.
//!
//! These are row-oriented, display-ready structures. They are only ever produced by decoding a
//! store read; nothing in the client mutates them after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places of the native currency amounts stored by the contract (wei).
pub const NATIVE_TOKEN_DECIMALS: u32 = 18;

/// An account identifier, rendered as `0x`-prefixed hex when decoded from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build an address from its 20 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A funding goal record owned by an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Position of the campaign in the store, used as its id for donor reads and donations.
    pub id: u64,
    pub owner: Address,
    pub title: String,
    pub description: String,
    /// Image reference (URL).
    pub image: String,
    /// Funding target in base units.
    pub target: u128,
    pub deadline: DateTime<Utc>,
    /// Collected amount in base units, as of the last successful fetch.
    pub amount_collected: u128,
}

/// One donor's contribution to one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub campaign_id: u64,
    pub donor: Address,
    pub amount: u128,
}

/// Status of the most recent fetch for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Error(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }
}
