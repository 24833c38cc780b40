//!
//! Utility module for the crowdfunding client.
//!
//! Re-exports amount formatting and parsing helpers used by the store adapter, the submitter and
//! the terminal front-end.
/// Utility functions for formatting and parsing token amounts
pub mod index;

pub use index::*;
