//! Runtime configuration.
//!
//! Values start from [`AppConfig::default`], are overridden by `CROWDFUND_*` environment variables
//! and finally by command line arguments.

use crate::campaign::Address;

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_RPC_URL: &str = "CROWDFUND_RPC_URL";
pub const ENV_CONTRACT: &str = "CROWDFUND_CONTRACT";
pub const ENV_ACCOUNT: &str = "CROWDFUND_ACCOUNT";
pub const ENV_POLL_INTERVAL_MS: &str = "CROWDFUND_POLL_INTERVAL_MS";
pub const ENV_CONFIRMATION_TIMEOUT_SECS: &str = "CROWDFUND_CONFIRMATION_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CROWDFUND_REQUEST_TIMEOUT_SECS";
pub const ENV_CONTRACTS_DIR: &str = "CROWDFUND_CONTRACTS_DIR";
pub const ENV_BUILD_DIR: &str = "CROWDFUND_BUILD_DIR";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("Invalid value {value:?} for {name}: expected a whole number")]
	InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
	/// JSON-RPC endpoint of the node.
	pub rpc_url: String,
	/// Address of the deployed campaign contract.
	pub contract: Address,
	/// Node-managed account donations are sent from.
	pub account: Option<Address>,
	/// Delay between receipt polls.
	pub poll_interval: Duration,
	/// How long to wait for a donation to be included.
	pub confirmation_timeout: Duration,
	/// Timeout of a single RPC request.
	pub request_timeout: Duration,
	pub contracts_dir: PathBuf,
	pub build_dir: PathBuf,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			rpc_url: "http://127.0.0.1:8545".to_string(),
			// First deployment address of a fresh local development node.
			contract: Address::new("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
			account: None,
			poll_interval: Duration::from_secs(1),
			confirmation_timeout: Duration::from_secs(120),
			request_timeout: Duration::from_secs(30),
			contracts_dir: PathBuf::from("contracts"),
			build_dir: PathBuf::from("build"),
		}
	}
}

impl AppConfig {
	/// Defaults overridden by the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::default().with_overrides(|name| std::env::var(name).ok())
	}

	/// Apply overrides looked up by variable name. Empty values are ignored.
	pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

		if let Some(url) = get(ENV_RPC_URL) {
			self.rpc_url = url;
		}
		if let Some(contract) = get(ENV_CONTRACT) {
			self.contract = Address::new(contract);
		}
		if let Some(account) = get(ENV_ACCOUNT) {
			self.account = Some(Address::new(account));
		}
		if let Some(ms) = get(ENV_POLL_INTERVAL_MS) {
			self.poll_interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &ms)?);
		}
		if let Some(secs) = get(ENV_CONFIRMATION_TIMEOUT_SECS) {
			self.confirmation_timeout =
				Duration::from_secs(parse_number(ENV_CONFIRMATION_TIMEOUT_SECS, &secs)?);
		}
		if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS) {
			self.request_timeout =
				Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &secs)?);
		}
		if let Some(dir) = get(ENV_CONTRACTS_DIR) {
			self.contracts_dir = PathBuf::from(dir);
		}
		if let Some(dir) = get(ENV_BUILD_DIR) {
			self.build_dir = PathBuf::from(dir);
		}

		Ok(self)
	}
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
	value
		.trim()
		.parse()
		.map_err(|_| ConfigError::InvalidNumber {
			name,
			value: value.to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn defaults_target_a_local_node() {
		let config = AppConfig::default();
		assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
		assert_eq!(config.account, None);
		assert_eq!(config.poll_interval, Duration::from_secs(1));
		assert_eq!(config.confirmation_timeout, Duration::from_secs(120));
		assert_eq!(config.request_timeout, Duration::from_secs(30));
		assert_eq!(config.build_dir, PathBuf::from("build"));
	}

	#[test]
	fn environment_overrides_defaults() {
		let config = AppConfig::default()
			.with_overrides(lookup(&[
				(ENV_RPC_URL, "http://node:8545"),
				(ENV_ACCOUNT, "0xabc"),
				(ENV_POLL_INTERVAL_MS, "250"),
				(ENV_CONTRACTS_DIR, ""),
			]))
			.unwrap();

		assert_eq!(config.rpc_url, "http://node:8545");
		assert_eq!(config.account, Some(Address::new("0xabc")));
		assert_eq!(config.poll_interval, Duration::from_millis(250));
		assert_eq!(config.contracts_dir, PathBuf::from("contracts"));
	}

	#[test]
	fn rejects_malformed_numbers() {
		let err = AppConfig::default()
			.with_overrides(lookup(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")]))
			.unwrap_err();
		assert_eq!(
			err,
			ConfigError::InvalidNumber {
				name: ENV_REQUEST_TIMEOUT_SECS,
				value: "soon".to_string()
			}
		);
	}
}
