//! Campaign contract ABI.
//!
//! The contract's read and donate entry points are declared with `sol!`; call data and return
//! data go through the generated `SolCall` implementations.

use super::types::{RawCampaignColumns, RawDonators, StoreError};
use crate::campaign::Address;

use alloy_primitives::U256;
use alloy_sol_types::{SolCall, sol};

sol! {
	/// Every campaign as seven index-aligned columns.
	function getAllCampaigns() external view returns (
		address[] owners,
		string[] titles,
		string[] descriptions,
		uint256[] targets,
		uint256[] deadlines,
		uint256[] amountCollecteds,
		string[] images
	);

	/// Donors of one campaign and what each gave.
	function getDonators(uint256 id) external view returns (address[] donators, uint256[] donations);

	function donateToCampaign(uint256 id) external payable;
}

pub fn get_all_campaigns_call() -> Vec<u8> {
	getAllCampaignsCall {}.abi_encode()
}

pub fn get_donators_call(campaign_id: u64) -> Vec<u8> {
	getDonatorsCall {
		id: U256::from(campaign_id),
	}
	.abi_encode()
}

pub fn donate_to_campaign_call(campaign_id: u64) -> Vec<u8> {
	donateToCampaignCall {
		id: U256::from(campaign_id),
	}
	.abi_encode()
}

/// Decode the return data of `getAllCampaigns()`.
pub fn decode_campaign_columns(data: &[u8]) -> Result<RawCampaignColumns, StoreError> {
	let columns = getAllCampaignsCall::abi_decode_returns(data)?;
	Ok(RawCampaignColumns {
		owners: addresses(columns.owners),
		titles: columns.titles,
		descriptions: columns.descriptions,
		targets: amounts(columns.targets)?,
		deadlines: amounts(columns.deadlines)?,
		amount_collecteds: amounts(columns.amountCollecteds)?,
		images: columns.images,
	})
}

/// Decode the return data of `getDonators(uint256)`.
pub fn decode_donators(data: &[u8]) -> Result<RawDonators, StoreError> {
	let donators = getDonatorsCall::abi_decode_returns(data)?;
	Ok(RawDonators {
		donors: addresses(donators.donators),
		amounts: amounts(donators.donations)?,
	})
}

fn addresses(values: Vec<alloy_primitives::Address>) -> Vec<Address> {
	values
		.iter()
		.map(|address| Address::from_bytes(address.as_slice()))
		.collect()
}

fn amounts(values: Vec<U256>) -> Result<Vec<u128>, StoreError> {
	values
		.into_iter()
		.map(|value| u128::try_from(value).map_err(|_| StoreError::ValueOutOfRange(value.to_string())))
		.collect()
}
