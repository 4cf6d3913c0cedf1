//! claimgate-genesis
//!
//! Writes the founding state of a deployment straight into a `StateDb`:
//! owner, authorizer key, optional vesting config and the initial custody
//! balance. Runs once per database; afterwards all changes go through the
//! claim engine.

pub mod params;

pub use params::GenesisParams;

use claimgate_core::error::ClaimError;
use claimgate_state::{Custodian, LedgerCustodian, StateDb};
use std::sync::Arc;
use tracing::info;

/// Apply `params` to an empty database and return the funded custodian.
pub fn apply_genesis(db: &Arc<StateDb>, params: &GenesisParams) -> Result<LedgerCustodian, ClaimError> {
    if db.owner()?.is_some() || db.authorizer()?.is_some() {
        return Err(ClaimError::AlreadyInitialized);
    }
    for addr in [&params.owner, &params.authorizer, &params.custody] {
        if addr.is_zero() {
            return Err(ClaimError::InvalidAddress);
        }
    }
    // Drains pay the owner out of custody; the two must be distinct ledgers.
    if params.owner == params.custody {
        return Err(ClaimError::InvalidAddress);
    }
    if let Some(vesting) = &params.vesting {
        vesting.validate()?;
    }

    info!(owner = %params.owner, authorizer = %params.authorizer, "applying claimgate genesis");

    db.put_owner(&params.owner)?;
    db.put_authorizer(&params.authorizer)?;
    db.put_custody(&params.custody)?;
    if let Some(vesting) = &params.vesting {
        db.put_vesting_config(vesting)?;
        info!(
            start = vesting.start,
            period_duration = vesting.period_duration,
            period_count = vesting.period_count,
            "genesis: vesting config stored"
        );
    }

    let custodian = LedgerCustodian::new(Arc::clone(db), params.custody);
    if params.initial_custody > 0 {
        custodian.deposit(&params.custody, params.initial_custody)?;
    }
    verify_genesis_custody(&custodian, params)?;

    db.flush()?;
    info!(custody = %params.custody, balance = params.initial_custody, "genesis state committed to disk");
    Ok(custodian)
}

/// The custody address must hold exactly the declared initial balance.
fn verify_genesis_custody(custodian: &LedgerCustodian, params: &GenesisParams) -> Result<(), ClaimError> {
    let have = custodian.balance_of(&params.custody)?;
    if have != params.initial_custody {
        return Err(ClaimError::InsufficientCustody { need: params.initial_custody, have });
    }
    Ok(())
}

/// Whether `db` already carries a genesis.
pub fn is_initialized(db: &StateDb) -> Result<bool, ClaimError> {
    Ok(db.owner()?.is_some())
}
