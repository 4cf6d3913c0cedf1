//! claimgate-core::authorization
//!
//! Records exchanged between the issuer, the engine and callers.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_VESTING_PERIODS;
use crate::error::ClaimError;
use crate::types::{Address, Amount, MessageHash, Nonce, Timestamp};

// ── ClaimAuthorization ───────────────────────────────────────────────────────

/// Off-chain issued permission for `recipient` to redeem up to `total_amount`.
///
/// Immutable. Its identity is its canonical hash; two authorizations with
/// equal fields are the same authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAuthorization {
    pub recipient: Address,
    pub total_amount: Amount,
    pub nonce: Nonce,
    pub deadline: Timestamp,
}

impl ClaimAuthorization {
    pub fn new(recipient: Address, total_amount: Amount, nonce: Nonce, deadline: Timestamp) -> Self {
        Self { recipient, total_amount, nonce, deadline }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.deadline
    }
}

// ── VestingConfig ────────────────────────────────────────────────────────────

/// Process-wide vesting parameters. The first period unlocks at `start`,
/// one more every `period_duration` seconds until `period_count` are out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingConfig {
    pub start: Timestamp,
    pub period_duration: i64,
    pub period_count: u32,
}

impl VestingConfig {
    pub fn new(start: Timestamp, period_duration: i64, period_count: u32) -> Self {
        Self { start, period_duration, period_count }
    }

    /// Degenerate schedule: everything unlocked from the epoch on.
    pub fn immediate() -> Self {
        Self { start: 0, period_duration: 0, period_count: 1 }
    }

    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.period_count == 0 {
            return Err(ClaimError::InvalidVestingConfig("period_count must be at least 1".into()));
        }
        if self.period_count > MAX_VESTING_PERIODS {
            return Err(ClaimError::InvalidVestingConfig(format!(
                "period_count must be at most {MAX_VESTING_PERIODS}"
            )));
        }
        if self.period_duration < 0 {
            return Err(ClaimError::InvalidVestingConfig("period_duration must not be negative".into()));
        }
        if self.period_count > 1 && self.period_duration == 0 {
            return Err(ClaimError::InvalidVestingConfig(
                "multi-period schedules need a non-zero period_duration".into(),
            ));
        }
        Ok(())
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start
    }

    /// Timestamp at which the final period unlocks.
    pub fn end(&self) -> Timestamp {
        let periods = i64::from(self.period_count.saturating_sub(1));
        self.start.saturating_add(self.period_duration.saturating_mul(periods))
    }
}

// ── AdminCommand ─────────────────────────────────────────────────────────────

/// An owner-only state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    RotateAuthorizer { new_key: Address },
    SetVestingStart { new_start: Timestamp },
    EmergencyDrain { amount: Amount },
}

impl AdminAction {
    /// Byte identifying the action inside a packed command.
    pub fn tag(&self) -> u8 {
        match self {
            AdminAction::RotateAuthorizer { .. } => 1,
            AdminAction::SetVestingStart { .. } => 2,
            AdminAction::EmergencyDrain { .. } => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::RotateAuthorizer { .. } => "rotate_authorizer",
            AdminAction::SetVestingStart { .. } => "set_vesting_start",
            AdminAction::EmergencyDrain { .. } => "emergency_drain",
        }
    }
}

/// An owner action bound to the deployment's command nonce and a deadline.
///
/// The owner key signs the command's packed hash. Each nonce is accepted
/// once, in order, so a captured command cannot be replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCommand {
    pub action: AdminAction,
    pub nonce: Nonce,
    pub deadline: Timestamp,
}

impl AdminCommand {
    pub fn new(action: AdminAction, nonce: Nonce, deadline: Timestamp) -> Self {
        Self { action, nonce, deadline }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.deadline
    }
}

// ── ClaimReceipt ─────────────────────────────────────────────────────────────

/// Audit record produced by every committed claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub recipient: Address,
    /// Amount moved by this claim.
    pub claimed: Amount,
    /// Total released for this authorization so far, including `claimed`.
    pub cumulative: Amount,
    pub hash: MessageHash,
    /// True once the authorization has nothing left to release.
    pub fully_claimed: bool,
}

// ── ClaimableInfo ────────────────────────────────────────────────────────────

/// Snapshot answer to "what could this authorization release right now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableInfo {
    pub claimable_now: Amount,
    pub already_claimed: Amount,
    pub total_available: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_inclusive() {
        let auth = ClaimAuthorization::new(Address::from_bytes([1; 20]), 10, 0, 100);
        assert!(!auth.is_expired(100));
        assert!(auth.is_expired(101));
    }

    #[test]
    fn zero_periods_rejected() {
        let cfg = VestingConfig::new(0, 10, 0);
        assert!(matches!(cfg.validate(), Err(ClaimError::InvalidVestingConfig(_))));
    }

    #[test]
    fn multi_period_needs_duration() {
        assert!(VestingConfig::new(0, 0, 4).validate().is_err());
        assert!(VestingConfig::new(0, 0, 1).validate().is_ok());
        assert!(VestingConfig::immediate().validate().is_ok());
    }

    #[test]
    fn period_count_is_bounded() {
        assert!(VestingConfig::new(0, 10, MAX_VESTING_PERIODS).validate().is_ok());
        assert!(matches!(
            VestingConfig::new(0, 10, MAX_VESTING_PERIODS + 1).validate(),
            Err(ClaimError::InvalidVestingConfig(_))
        ));
        assert!(VestingConfig::new(0, 10, u32::MAX).validate().is_err());
    }

    #[test]
    fn admin_tags_are_distinct() {
        let actions = [
            AdminAction::RotateAuthorizer { new_key: Address::from_bytes([1; 20]) },
            AdminAction::SetVestingStart { new_start: 5 },
            AdminAction::EmergencyDrain { amount: 5 },
        ];
        let tags: Vec<u8> = actions.iter().map(AdminAction::tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn end_is_last_unlock() {
        let cfg = VestingConfig::new(1_000, 100, 4);
        assert_eq!(cfg.end(), 1_300);
    }
}
