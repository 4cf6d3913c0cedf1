use std::sync::Arc;

use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, Amount};
use tracing::debug;

use crate::db::StateDb;

/// External holder of the redeemable resource.
///
/// The engine only asks two things of it: how much is held, and to move
/// some of it out. A transfer that returns `Ok(false)` or an error aborts the
/// claim that requested it.
pub trait Custodian: Send + Sync {
    /// Address whose balance funds claims.
    fn holder(&self) -> Address;

    fn balance_of(&self, holder: &Address) -> Result<Amount, ClaimError>;

    /// Move `amount` from `holder()` to `to`.
    fn transfer(&self, to: &Address, amount: Amount) -> Result<bool, ClaimError>;
}

/// Custodian backed by the `balances` tree of the state database.
pub struct LedgerCustodian {
    db: Arc<StateDb>,
    custody: Address,
}

impl LedgerCustodian {
    pub fn new(db: Arc<StateDb>, custody: Address) -> Self {
        Self { db, custody }
    }

    /// Credit `amount` to `to` out of thin air. Genesis funding only.
    pub fn deposit(&self, to: &Address, amount: Amount) -> Result<(), ClaimError> {
        let balance = self.db.get_balance(to)?;
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| ClaimError::Serialization("balance overflow".into()))?;
        self.db.put_balance(to, updated)
    }
}

impl Custodian for LedgerCustodian {
    fn holder(&self) -> Address {
        self.custody
    }

    fn balance_of(&self, holder: &Address) -> Result<Amount, ClaimError> {
        self.db.get_balance(holder)
    }

    /// Debit and credit commit together. Transfers back to the custody
    /// address itself are refused, since nothing would move.
    fn transfer(&self, to: &Address, amount: Amount) -> Result<bool, ClaimError> {
        let moved = self.db.move_balance(&self.custody, to, amount)?;
        if !moved {
            debug!(%to, amount, "custody transfer refused");
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (LedgerCustodian, Address) {
        let db = Arc::new(StateDb::temporary().unwrap());
        let custody = Address::from_bytes([0xcc; 20]);
        let c = LedgerCustodian::new(db, custody);
        c.deposit(&custody, 1_000).unwrap();
        (c, custody)
    }

    #[test]
    fn transfer_moves_balance() {
        let (c, custody) = setup();
        let to = Address::from_bytes([1; 20]);
        assert!(c.transfer(&to, 400).unwrap());
        assert_eq!(c.balance_of(&custody).unwrap(), 600);
        assert_eq!(c.balance_of(&to).unwrap(), 400);
    }

    #[test]
    fn overdraw_reports_failure() {
        let (c, custody) = setup();
        let to = Address::from_bytes([1; 20]);
        assert!(!c.transfer(&to, 1_001).unwrap());
        assert_eq!(c.balance_of(&custody).unwrap(), 1_000);
        assert_eq!(c.balance_of(&to).unwrap(), 0);
    }

    #[test]
    fn transfer_to_custody_itself_is_refused() {
        let (c, custody) = setup();
        assert!(!c.transfer(&custody, 10).unwrap());
        assert_eq!(c.balance_of(&custody).unwrap(), 1_000);
    }
}
