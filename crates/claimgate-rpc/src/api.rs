use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcClaimReceipt, RpcClaimStatus, RpcClaimable, RpcRelease, RpcVestingConfig};

/// ClaimGate JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "claimgate_" via `namespace = "claimgate"`.
/// Authorizations are always passed as their four fields
/// (recipient, amount, nonce, deadline); the hash is derived server-side.
#[rpc(server, client, namespace = "claimgate")]
pub trait ClaimgateApi {
    // ── Claims ────────────────────────────────────────────────────────────────

    /// Redeem the currently claimable part of an authorization. The caller
    /// is the recipient.
    #[method(name = "submitClaim")]
    async fn submit_claim(
        &self,
        caller: String,
        amount: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<RpcClaimReceipt>;

    #[method(name = "queryUsed")]
    async fn query_used(&self, recipient: String, amount: String, nonce: u64, deadline: i64) -> RpcResult<bool>;

    /// Same signature check `submitClaim` applies. Malformed signatures give `false`.
    #[method(name = "queryVerify")]
    async fn query_verify(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<bool>;

    #[method(name = "queryClaimable")]
    async fn query_claimable(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
    ) -> RpcResult<RpcClaimable>;

    #[method(name = "getClaimStatus")]
    async fn get_claim_status(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
    ) -> RpcResult<RpcClaimStatus>;

    /// Cumulative amount redeemed under an authorization (u128 as string).
    #[method(name = "getRedeemed")]
    async fn get_redeemed(&self, recipient: String, amount: String, nonce: u64, deadline: i64) -> RpcResult<String>;

    #[method(name = "getReleaseSchedule")]
    async fn get_release_schedule(&self, amount: String) -> RpcResult<Vec<RpcRelease>>;

    // ── Deployment state ──────────────────────────────────────────────────────

    #[method(name = "getAuthorizer")]
    async fn get_authorizer(&self) -> RpcResult<String>;

    #[method(name = "getOwner")]
    async fn get_owner(&self) -> RpcResult<String>;

    #[method(name = "getVestingConfig")]
    async fn get_vesting_config(&self) -> RpcResult<RpcVestingConfig>;

    #[method(name = "getCustodyBalance")]
    async fn get_custody_balance(&self) -> RpcResult<String>;

    // ── Owner operations ──────────────────────────────────────────────────────
    //
    // Each owner method carries the admin nonce, a deadline and the owner
    // key's signature over the packed command. Nothing the client asserts
    // about its own identity is trusted.

    /// Nonce the next owner command must carry.
    #[method(name = "getAdminNonce")]
    async fn get_admin_nonce(&self) -> RpcResult<u64>;

    #[method(name = "rotateAuthorizerKey")]
    async fn rotate_authorizer_key(
        &self,
        new_key: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<bool>;

    #[method(name = "setVestingStart")]
    async fn set_vesting_start(&self, new_start: i64, nonce: u64, deadline: i64, signature: String) -> RpcResult<bool>;

    /// Returns the custody balance left after the drain.
    #[method(name = "emergencyDrain")]
    async fn emergency_drain(&self, amount: String, nonce: u64, deadline: i64, signature: String) -> RpcResult<String>;
}
