//! Client-side view-state synchronization for a crowdfunding contract.
//!
//! The synchronizers in [`sync`] fetch campaigns and donations from a [`store::CampaignStore`],
//! publish display-ready view state, and drive donations through a
//! [`transaction::TransactionSubmitter`]. JSON-RPC adapters for both are included, along with the
//! [`artifact`] compiler used to build the contract's ABI and bytecode.

pub mod artifact;
pub mod campaign;
pub mod config;
pub mod store;
pub mod sync;
pub mod transaction;
pub mod utils;
