//! Donate transaction builder
//!
//! This module provides a builder for the `eth_sendTransaction` request of a
//! `donateToCampaign(uint256)` call.

use crate::campaign::{Address, NATIVE_TOKEN_DECIMALS};
use crate::store::abi::donate_to_campaign_call;
use crate::transaction::{DonateMutation, SubmissionError};
use crate::utils::parse_token_amount;

use serde::Serialize;

/// Transaction request as accepted by `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
	pub from: String,
	pub to: String,
	/// Hex quantity in base units.
	pub value: String,
	/// Hex call data.
	pub data: String,
}

/// Builder for donate transactions
#[derive(Default)]
pub struct DonateTransactionBuilder {
	/// The campaign contract
	contract: Option<Address>,
	/// The donation being made
	mutation: Option<DonateMutation>,
}

impl DonateTransactionBuilder {
	/// Creates a new transaction builder
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the contract receiving the call
	pub fn with_contract(mut self, contract: Address) -> Self {
		self.contract = Some(contract);
		self
	}

	/// Sets the donation
	pub fn with_mutation(mut self, mutation: DonateMutation) -> Self {
		self.mutation = Some(mutation);
		self
	}

	/// Builds the request, converting the entered amount to base units
	pub fn build(self) -> Result<TransactionRequest, SubmissionError> {
		let contract = self.contract.ok_or(SubmissionError::MissingField("contract"))?;
		let mutation = self.mutation.ok_or(SubmissionError::MissingField("mutation"))?;

		let value = parse_token_amount(&mutation.amount, NATIVE_TOKEN_DECIMALS)?;
		log::info!(
			"Building donation of {} to campaign {} (owner {}) from {}",
			mutation.amount,
			mutation.campaign_id,
			mutation.owner,
			mutation.donor
		);

		let data = donate_to_campaign_call(mutation.campaign_id);

		Ok(TransactionRequest {
			from: mutation.donor.to_string(),
			to: contract.to_string(),
			value: format!("{:#x}", value),
			data: format!("0x{}", hex::encode(data)),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mutation(amount: &str) -> DonateMutation {
		DonateMutation {
			campaign_id: 3,
			amount: amount.to_string(),
			donor: Address::new("0x00000000000000000000000000000000000000d0"),
			owner: Address::new("0x00000000000000000000000000000000000000e0"),
		}
	}

	#[test]
	fn builds_donate_request() {
		let request = DonateTransactionBuilder::new()
			.with_contract(Address::new("0x00000000000000000000000000000000000000c0"))
			.with_mutation(mutation("1.5"))
			.build()
			.unwrap();

		assert_eq!(request.from, "0x00000000000000000000000000000000000000d0");
		assert_eq!(request.to, "0x00000000000000000000000000000000000000c0");
		assert_eq!(request.value, "0x14d1120d7b160000");
		assert_eq!(
			request.data,
			format!("0x42a4fda8{}03", "0".repeat(62))
		);
	}

	#[test]
	fn rejects_bad_amount() {
		let result = DonateTransactionBuilder::new()
			.with_contract(Address::new("0xc0"))
			.with_mutation(mutation("abc"))
			.build();
		assert!(matches!(result, Err(SubmissionError::InvalidAmount(_))));
	}

	#[test]
	fn requires_contract() {
		let result = DonateTransactionBuilder::new()
			.with_mutation(mutation("1"))
			.build();
		assert!(matches!(result, Err(SubmissionError::MissingField("contract"))));
	}
}
