use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, Amount, MessageHash};

use crate::db::StateDb;

/// Replay bookkeeping over the `redemptions` and `used` trees.
///
/// Cumulative amounts only grow and the used set only gains members.
/// The sole exception is `restore`, which the engine calls to undo its own
/// uncommitted write when the custodian refuses a transfer.
pub struct ReplayGuard<'a> {
    db: &'a StateDb,
}

/// Replay state of one (recipient, hash) pair captured before a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySnapshot {
    pub recipient: Address,
    pub hash: MessageHash,
    pub redeemed: Option<Amount>,
    pub fully_used: bool,
}

impl<'a> ReplayGuard<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn is_fully_used(&self, hash: &MessageHash) -> Result<bool, ClaimError> {
        self.db.is_used(hash)
    }

    /// Cumulative amount released so far; 0 when nothing was redeemed.
    pub fn redeemed_amount(&self, recipient: &Address, hash: &MessageHash) -> Result<Amount, ClaimError> {
        Ok(self.db.get_redeemed(recipient, hash)?.unwrap_or(0))
    }

    /// Raise the cumulative amount and, when `fully_used`, add the hash to
    /// the used set. Nothing is written unless both changes land.
    pub fn record_redemption(
        &self,
        recipient: &Address,
        hash: &MessageHash,
        new_cumulative: Amount,
        fully_used: bool,
    ) -> Result<(), ClaimError> {
        let current = self.redeemed_amount(recipient, hash)?;
        if new_cumulative < current {
            return Err(ClaimError::RedemptionDecrease { current, proposed: new_cumulative });
        }
        self.db.commit_redemption(recipient, hash, new_cumulative, fully_used)
    }

    pub fn snapshot(&self, recipient: &Address, hash: &MessageHash) -> Result<ReplaySnapshot, ClaimError> {
        Ok(ReplaySnapshot {
            recipient: *recipient,
            hash: *hash,
            redeemed: self.db.get_redeemed(recipient, hash)?,
            fully_used: self.db.is_used(hash)?,
        })
    }

    /// Put the pair back exactly as `snapshot` saw it, in one transaction.
    pub fn restore(&self, snapshot: &ReplaySnapshot) -> Result<(), ClaimError> {
        self.db
            .revert_redemption(&snapshot.recipient, &snapshot.hash, snapshot.redeemed, snapshot.fully_used)
    }
}
