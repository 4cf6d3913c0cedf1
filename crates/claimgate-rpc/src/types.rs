use claimgate_core::authorization::{ClaimReceipt, ClaimableInfo, VestingConfig};
use claimgate_core::types::Timestamp;
use claimgate_state::ClaimStatus;
use claimgate_vesting::Release;
use serde::{Deserialize, Serialize};

/// Result of a successful `claimgate_submitClaim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcClaimReceipt {
    pub recipient: String,
    /// Released by this call (u128 as string).
    pub claimed: String,
    /// Released so far under the authorization (u128 as string).
    pub cumulative: String,
    pub hash: String,
    pub fully_claimed: bool,
}

impl From<ClaimReceipt> for RpcClaimReceipt {
    fn from(r: ClaimReceipt) -> Self {
        Self {
            recipient: r.recipient.to_hex(),
            claimed: r.claimed.to_string(),
            cumulative: r.cumulative.to_string(),
            hash: r.hash.to_hex(),
            fully_claimed: r.fully_claimed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcClaimable {
    pub claimable_now: String,
    pub already_claimed: String,
    pub total_available: String,
}

impl From<ClaimableInfo> for RpcClaimable {
    fn from(i: ClaimableInfo) -> Self {
        Self {
            claimable_now: i.claimable_now.to_string(),
            already_claimed: i.already_claimed.to_string(),
            total_available: i.total_available.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcClaimStatus {
    pub hash: String,
    /// "unclaimed", "partially_claimed" or "fully_claimed".
    pub state: String,
    pub redeemed: String,
    pub description: String,
}

impl RpcClaimStatus {
    pub fn new(hash: String, status: ClaimStatus, redeemed: u128, description: String) -> Self {
        let state = match status {
            ClaimStatus::Unclaimed => "unclaimed",
            ClaimStatus::PartiallyClaimed(_) => "partially_claimed",
            ClaimStatus::FullyClaimed => "fully_claimed",
        };
        Self { hash, state: state.to_string(), redeemed: redeemed.to_string(), description }
    }
}

/// Schedule kind of the running engine plus the stored vesting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcVestingConfig {
    /// "instant" or "vesting".
    pub schedule: String,
    pub start: Timestamp,
    pub period_duration: i64,
    pub period_count: u32,
    pub end: Timestamp,
}

impl RpcVestingConfig {
    pub fn new(schedule: &str, config: &VestingConfig) -> Self {
        Self {
            schedule: schedule.to_string(),
            start: config.start,
            period_duration: config.period_duration,
            period_count: config.period_count,
            end: config.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRelease {
    pub index: u32,
    pub unlock_at: Timestamp,
    pub amount: String,
    pub cumulative: String,
}

impl From<Release> for RpcRelease {
    fn from(r: Release) -> Self {
        Self {
            index: r.index,
            unlock_at: r.unlock_at,
            amount: r.amount.to_string(),
            cumulative: r.cumulative.to_string(),
        }
    }
}
