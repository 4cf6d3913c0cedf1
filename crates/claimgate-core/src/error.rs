use thiserror::Error;

use crate::types::{Amount, Nonce, Timestamp};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    // ── Claim validation ─────────────────────────────────────────────────────
    #[error("authorization expired at {deadline}")]
    ExpiredAuthorization { deadline: Timestamp },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("vesting has not started (starts at {start})")]
    VestingNotStarted { start: Timestamp },

    #[error("invalid signature length: expected 65 bytes, got {got}")]
    InvalidSignatureLength { got: usize },

    #[error("signature does not match the current authorizer")]
    SignatureMismatch,

    #[error("authorization already fully redeemed")]
    ReplayedAuthorization,

    #[error("nothing to claim yet")]
    NothingToClaim,

    #[error("insufficient custody: need {need}, have {have}")]
    InsufficientCustody { need: Amount, have: Amount },

    #[error("custodian transfer failed")]
    TransferFailed,

    // ── Concurrency ──────────────────────────────────────────────────────────
    #[error("reentrant call rejected")]
    ReentrantCall,

    // ── Replay bookkeeping ───────────────────────────────────────────────────
    #[error("redemption record cannot decrease: current {current}, proposed {proposed}")]
    RedemptionDecrease { current: Amount, proposed: Amount },

    // ── Administration ───────────────────────────────────────────────────────
    #[error("caller is not the owner")]
    Unauthorized,

    #[error("owner command expired at {deadline}")]
    ExpiredAdminCommand { deadline: Timestamp },

    #[error("stale owner command nonce: expected {expected}, got {got}")]
    StaleAdminNonce { expected: Nonce, got: Nonce },

    #[error("zero address not allowed")]
    InvalidAddress,

    #[error("vesting already started; start time is frozen")]
    VestingAlreadyStarted,

    #[error("invalid vesting config: {0}")]
    InvalidVestingConfig(String),

    #[error("state not initialized: {0}")]
    NotInitialized(&'static str),

    #[error("state already initialized")]
    AlreadyInitialized,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
