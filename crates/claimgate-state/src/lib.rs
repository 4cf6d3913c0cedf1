//! claimgate-state
//!
//! Persistent redemption state and the claim engine that mutates it.

pub mod custodian;
pub mod db;
pub mod engine;
pub mod guard;
pub mod query;
pub mod replay;

pub use custodian::{Custodian, LedgerCustodian};
pub use db::StateDb;
pub use engine::ClaimEngine;
pub use guard::CallGuard;
pub use query::{ClaimQuery, ClaimStatus};
pub use replay::ReplayGuard;
