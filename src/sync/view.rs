//! Derived, display-ready fields of a campaign.

use crate::campaign::Campaign;

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Shown in place of a reward description; rewards are not implemented by the contract.
pub const REWARD_NOT_SET: &str = "Reward not set yet !";
/// Shown when a campaign has no donations yet.
pub const NO_DONATORS: &str = "No donators yet. Be the first one!";

/// The "days left" counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysLeft {
	Remaining(i64),
	Ended,
}

/// What the funding area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingPanel {
	/// The donate control is active.
	Open,
	/// The campaign is over; shows what it ended with.
	Ended { amount_collected: u128 },
}

/// Fields derived from a campaign and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignSummary {
	pub remaining_days: i64,
	pub days_left: DaysLeft,
	/// Progress bar width, 0..=100.
	pub bar_percentage: u8,
	pub funding: FundingPanel,
}

impl CampaignSummary {
	pub fn derive(campaign: &Campaign, now: DateTime<Utc>) -> Self {
		let remaining_days = remaining_days(campaign.deadline, now);
		let (days_left, funding) = if remaining_days < 0 {
			(
				DaysLeft::Ended,
				FundingPanel::Ended {
					amount_collected: campaign.amount_collected,
				},
			)
		} else {
			// Zero days left still accepts donations.
			(DaysLeft::Remaining(remaining_days), FundingPanel::Open)
		};

		Self {
			remaining_days,
			days_left,
			bar_percentage: bar_percentage(campaign.target, campaign.amount_collected),
			funding,
		}
	}
}

/// `ceil((deadline - now) / 1 day)`.
pub fn remaining_days(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
	let millis = (deadline - now).num_milliseconds();
	let days = millis.div_euclid(MILLIS_PER_DAY);
	if millis.rem_euclid(MILLIS_PER_DAY) != 0 {
		days + 1
	} else {
		days
	}
}

/// Funding progress as a whole percentage, rounded and clamped to `0..=100`.
///
/// A zero target counts as fully funded.
pub fn bar_percentage(target: u128, amount_collected: u128) -> u8 {
	if target == 0 || amount_collected >= target {
		return 100;
	}

	let percentage = amount_collected
		.checked_mul(100)
		.and_then(|scaled| scaled.checked_add(target / 2))
		.map(|scaled| scaled / target)
		.unwrap_or_else(|| ((amount_collected as f64 / target as f64) * 100.0).round() as u128);

	percentage.min(100) as u8
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::campaign::Address;
	use chrono::{Duration, TimeZone};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
	}

	fn campaign(target: u128, amount_collected: u128, deadline: DateTime<Utc>) -> Campaign {
		Campaign {
			id: 0,
			owner: Address::new("0x01"),
			title: "Library".to_string(),
			description: "Books".to_string(),
			image: "https://img".to_string(),
			target,
			deadline,
			amount_collected,
		}
	}

	#[test]
	fn open_campaign_with_partial_funding() {
		let summary = CampaignSummary::derive(&campaign(100, 40, now() + Duration::days(5)), now());
		assert_eq!(summary.bar_percentage, 40);
		assert_eq!(summary.remaining_days, 5);
		assert_eq!(summary.days_left, DaysLeft::Remaining(5));
		assert_eq!(summary.funding, FundingPanel::Open);
	}

	#[test]
	fn ended_campaign_shows_summary() {
		let summary =
			CampaignSummary::derive(&campaign(100, 100, now() - Duration::days(1)), now());
		assert_eq!(summary.bar_percentage, 100);
		assert_eq!(summary.days_left, DaysLeft::Ended);
		assert_eq!(
			summary.funding,
			FundingPanel::Ended {
				amount_collected: 100
			}
		);
	}

	#[test]
	fn zero_days_left_is_still_open() {
		let summary = CampaignSummary::derive(&campaign(100, 0, now()), now());
		assert_eq!(summary.remaining_days, 0);
		assert_eq!(summary.days_left, DaysLeft::Remaining(0));
		assert_eq!(summary.funding, FundingPanel::Open);

		let summary = CampaignSummary::derive(
			&campaign(100, 0, now() - Duration::hours(3)),
			now(),
		);
		assert_eq!(summary.remaining_days, 0);
		assert_eq!(summary.funding, FundingPanel::Open);
	}

	#[test]
	fn remaining_days_rounds_up() {
		assert_eq!(remaining_days(now() + Duration::hours(1), now()), 1);
		assert_eq!(remaining_days(now() + Duration::hours(25), now()), 2);
		assert_eq!(remaining_days(now() - Duration::hours(25), now()), -1);
		assert_eq!(remaining_days(now() - Duration::hours(49), now()), -2);
	}

	#[test]
	fn ended_iff_negative_remaining_days() {
		for hours in -100i64..100 {
			let deadline = now() + Duration::hours(hours);
			let summary = CampaignSummary::derive(&campaign(10, 1, deadline), now());
			assert_eq!(
				summary.remaining_days < 0,
				summary.days_left == DaysLeft::Ended,
				"hours = {}",
				hours
			);
		}
	}

	#[test]
	fn bar_percentage_is_clamped() {
		assert_eq!(bar_percentage(100, 250), 100);
		assert_eq!(bar_percentage(100, 0), 0);
		assert_eq!(bar_percentage(3, 1), 33);
		assert_eq!(bar_percentage(3, 2), 67);
		assert_eq!(bar_percentage(0, 0), 100);
		assert_eq!(bar_percentage(0, 5), 100);
		assert_eq!(bar_percentage(u128::MAX, u128::MAX - 1), 100);
		assert_eq!(bar_percentage(u128::MAX, u128::MAX / 2), 50);
	}
}
