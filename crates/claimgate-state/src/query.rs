use claimgate_core::authorization::ClaimAuthorization;
use claimgate_core::error::ClaimError;
use claimgate_core::types::Amount;
use claimgate_crypto::hash_authorization;
use serde::{Deserialize, Serialize};

use crate::db::StateDb;

/// Redemption progress of a single authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "redeemed", rename_all = "snake_case")]
pub enum ClaimStatus {
    Unclaimed,
    PartiallyClaimed(Amount),
    FullyClaimed,
}

/// Read-only view over redemption state, keyed by authorization fields
/// rather than by hash.
pub struct ClaimQuery<'a> {
    db: &'a StateDb,
}

impl<'a> ClaimQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn redeemed(&self, auth: &ClaimAuthorization) -> Result<Amount, ClaimError> {
        let hash = hash_authorization(auth);
        Ok(self.db.get_redeemed(&auth.recipient, &hash)?.unwrap_or(0))
    }

    pub fn state_of(&self, auth: &ClaimAuthorization) -> Result<ClaimStatus, ClaimError> {
        let hash = hash_authorization(auth);
        if self.db.is_used(&hash)? {
            return Ok(ClaimStatus::FullyClaimed);
        }
        Ok(match self.db.get_redeemed(&auth.recipient, &hash)? {
            None | Some(0) => ClaimStatus::Unclaimed,
            Some(amount) => ClaimStatus::PartiallyClaimed(amount),
        })
    }

    /// One-line human summary, used by logs and the status RPC.
    pub fn describe(&self, auth: &ClaimAuthorization) -> Result<String, ClaimError> {
        Ok(match self.state_of(auth)? {
            ClaimStatus::Unclaimed => format!("unclaimed: 0 of {}", auth.total_amount),
            ClaimStatus::PartiallyClaimed(n) => format!("partially claimed: {n} of {}", auth.total_amount),
            ClaimStatus::FullyClaimed => format!("fully claimed: {0} of {0}", auth.total_amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimgate_core::types::Address;

    fn auth() -> ClaimAuthorization {
        ClaimAuthorization::new(Address::from_bytes([7; 20]), 1_000, 3, 2_000_000_000)
    }

    #[test]
    fn progresses_through_states() {
        let db = StateDb::temporary().unwrap();
        let q = ClaimQuery::new(&db);
        let a = auth();
        let hash = hash_authorization(&a);

        assert_eq!(q.state_of(&a).unwrap(), ClaimStatus::Unclaimed);
        assert_eq!(q.redeemed(&a).unwrap(), 0);

        db.commit_redemption(&a.recipient, &hash, 250, false).unwrap();
        assert_eq!(q.state_of(&a).unwrap(), ClaimStatus::PartiallyClaimed(250));
        assert_eq!(q.describe(&a).unwrap(), "partially claimed: 250 of 1000");

        db.commit_redemption(&a.recipient, &hash, 1_000, true).unwrap();
        assert_eq!(q.state_of(&a).unwrap(), ClaimStatus::FullyClaimed);
        assert_eq!(q.describe(&a).unwrap(), "fully claimed: 1000 of 1000");
    }

    #[test]
    fn status_serializes_tagged() {
        let json = serde_json::to_string(&ClaimStatus::PartiallyClaimed(5)).unwrap();
        assert_eq!(json, r#"{"state":"partially_claimed","redeemed":5}"#);
        let json = serde_json::to_string(&ClaimStatus::Unclaimed).unwrap();
        assert_eq!(json, r#"{"state":"unclaimed"}"#);
    }
}
