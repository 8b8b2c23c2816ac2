//! # Execution Chain Spec
//!
//! Revision table, intrinsic gas accounting, and header validation rules
//! that vary across hard forks — kept as one small collaborator the
//! executor consults rather than scattered `if revision >= X` checks.

pub mod chain;
pub mod gas;
pub mod header;
pub mod revision;

pub use chain::ChainSpec;
pub use gas::{floor_data_gas, intrinsic_gas, refund_quotient, AccessListCost};
pub use header::{static_validate_header, validate_against_parent, Header, HeaderError};
pub use revision::{ForkSchedule, Revision};
