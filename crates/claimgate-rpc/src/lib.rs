//! claimgate-rpc
//!
//! JSON-RPC 2.0 front end for a claim engine.
//!
//! Namespace: "claimgate"
//! Methods:
//!   claimgate_submitClaim           redeem against a signed authorization
//!   claimgate_queryUsed             whether an authorization is fully redeemed
//!   claimgate_queryVerify           whether a signature is valid for the fields
//!   claimgate_queryClaimable        claimable now / already claimed / unlocked
//!   claimgate_getClaimStatus        unclaimed, partially or fully claimed
//!   claimgate_getRedeemed           cumulative amount redeemed
//!   claimgate_getReleaseSchedule    per-period unlock steps
//!   claimgate_getAuthorizer         current authorizer address
//!   claimgate_getOwner              owner address
//!   claimgate_getVestingConfig      schedule kind and vesting parameters
//!   claimgate_getCustodyBalance     funds available for claims
//!   claimgate_getAdminNonce         nonce the next owner command must carry
//!   claimgate_rotateAuthorizerKey   owner-signed command
//!   claimgate_setVestingStart       owner-signed command, before vesting starts
//!   claimgate_emergencyDrain        owner-signed command
//!
//! Amounts are decimal strings; addresses, hashes and signatures are
//! 0x-prefixed hex. Browsers are only let in from origins passed to
//! `RpcServer::with_cors_origins`.

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcClaimReceipt, RpcClaimStatus, RpcClaimable, RpcRelease, RpcVestingConfig};
