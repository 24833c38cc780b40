//! View-state synchronization
//!
//! This module turns remote campaign reads into display-ready view state and drives donations:
//!
//! - `query`: observable read queries and the guard that processes each settlement once.
//! - `campaigns`: the campaign list synchronizer.
//! - `details`: the single-campaign synchronizer (donor list and donate life cycle).
//! - `view`: derived fields such as days left and funding percentage.
//! - `events`: user-visible notices and their dispatcher.
//!
//! Synchronizers receive everything external through a [`SyncContext`] and publish their state
//! through `tokio::sync::watch` channels.

/// Campaign list synchronizer
pub mod campaigns;
/// Single-campaign synchronizer
pub mod details;
/// Notices and notice handlers
pub mod events;
/// Observable read queries
pub mod query;
/// Error, context and clock types
mod types;
/// Derived view fields
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use campaigns::{CampaignListSynchronizer, CampaignListView};
pub use details::{CampaignDetailSynchronizer, CampaignDetailView};
pub use types::*;
