use claimgate_core::authorization::VestingConfig;
use claimgate_core::types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Founding parameters of a claim deployment.
///
/// Loaded from JSON by the node on first start; tests build them directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Only address allowed to rotate keys, move the vesting start and drain custody.
    pub owner: Address,
    /// Address of the secp256k1 key that signs authorizations.
    pub authorizer: Address,
    /// Ledger address that funds claims.
    pub custody: Address,
    /// Balance credited to `custody` at genesis.
    #[serde(default)]
    pub initial_custody: Amount,
    /// Absent for one-shot deployments.
    #[serde(default)]
    pub vesting: Option<VestingConfig>,
}

impl GenesisParams {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
