use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use claimgate_core::authorization::{AdminAction, AdminCommand, ClaimAuthorization};
use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, Amount, ClaimSignature, Timestamp};
use claimgate_crypto::hash_authorization;
use claimgate_state::{ClaimEngine, ClaimQuery, Custodian};
use claimgate_vesting::UnlockSchedule;

use crate::api::ClaimgateApiServer;
use crate::types::{RpcClaimReceipt, RpcClaimStatus, RpcClaimable, RpcRelease, RpcVestingConfig};

const INVALID_PARAMS: i32 = -32602;
const CLAIM_REJECTED: i32 = -32000;
const INTERNAL_ERROR: i32 = -32603;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Engine rejections are reported as -32000; storage trouble as internal errors.
fn claim_err(e: ClaimError) -> ErrorObject<'static> {
    match e {
        ClaimError::Storage(_) | ClaimError::Serialization(_) | ClaimError::NotInitialized(_) => {
            warn!(error = %e, "RPC: internal error");
            rpc_err(INTERNAL_ERROR, e.to_string())
        }
        other => rpc_err(CLAIM_REJECTED, other.to_string()),
    }
}

fn parse_address(s: &str) -> RpcResult<Address> {
    Address::from_hex(s).map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid address: {e}")))
}

fn parse_amount(s: &str) -> RpcResult<Amount> {
    s.parse::<Amount>()
        .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid amount: {e}")))
}

fn parse_signature(s: &str) -> RpcResult<ClaimSignature> {
    ClaimSignature::from_hex(s).map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid signature hex: {e}")))
}

fn parse_authorization(recipient: &str, amount: &str, nonce: u64, deadline: i64) -> RpcResult<ClaimAuthorization> {
    Ok(ClaimAuthorization::new(parse_address(recipient)?, parse_amount(amount)?, nonce, deadline))
}

/// Exact match against the configured origins. An empty list admits none.
fn origin_allowed(allowed: &[String], origin: &[u8]) -> bool {
    allowed.iter().any(|o| o.as_bytes() == origin)
}

/// Current unix time in seconds.
pub fn wall_clock() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState<S, C> {
    pub engine: Arc<ClaimEngine<S, C>>,
    /// Source of `now` for every engine call.
    pub clock: fn() -> Timestamp,
}

impl<S, C> RpcServerState<S, C> {
    pub fn new(engine: Arc<ClaimEngine<S, C>>) -> Self {
        Self { engine, clock: wall_clock }
    }
}

/// The RPC server implementation.
pub struct RpcServer<S, C> {
    state: Arc<RpcServerState<S, C>>,
    cors_origins: Vec<String>,
}

impl<S: UnlockSchedule, C: Custodian + 'static> RpcServer<S, C> {
    pub fn new(state: Arc<RpcServerState<S, C>>) -> Self {
        Self { state, cors_origins: Vec::new() }
    }

    /// Browser origins allowed to call the server, e.g.
    /// `https://wallet.example`. Other origins get no CORS grant.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    fn now(&self) -> Timestamp {
        (self.state.clock)()
    }

    fn engine(&self) -> &ClaimEngine<S, C> {
        &self.state.engine
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let allowed = self.cors_origins.clone();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin, _| {
                origin_allowed(&allowed, origin.as_bytes())
            }))
            .allow_methods(Any)
            .allow_headers(Any);
        let middleware = tower::ServiceBuilder::new().layer(cors);

        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;
        let bound = server.local_addr()?;
        let handle = server.start(self.into_rpc());
        info!(addr = %bound, "RPC server started");
        Ok((bound, handle))
    }

    /// Hand an owner-signed command to the engine.
    fn run_admin(&self, action: AdminAction, nonce: u64, deadline: i64, signature: &str) -> RpcResult<()> {
        let signature = parse_signature(signature)?;
        let command = AdminCommand::new(action, nonce, deadline);
        self.engine().execute_admin(&command, &signature, self.now()).map_err(|e| {
            info!(action = action.name(), nonce, error = %e, "RPC: owner command rejected");
            claim_err(e)
        })
    }
}

#[async_trait]
impl<S: UnlockSchedule, C: Custodian + 'static> ClaimgateApiServer for RpcServer<S, C> {
    async fn submit_claim(
        &self,
        caller: String,
        amount: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<RpcClaimReceipt> {
        let caller = parse_address(&caller)?;
        let amount = parse_amount(&amount)?;
        let signature = parse_signature(&signature)?;

        match self.engine().submit_claim(&caller, amount, nonce, deadline, &signature, self.now()) {
            Ok(receipt) => Ok(receipt.into()),
            Err(e) => {
                info!(recipient = %caller, nonce, error = %e, "RPC: claim rejected");
                Err(claim_err(e))
            }
        }
    }

    async fn query_used(&self, recipient: String, amount: String, nonce: u64, deadline: i64) -> RpcResult<bool> {
        let auth = parse_authorization(&recipient, &amount, nonce, deadline)?;
        self.engine()
            .query_used(&auth.recipient, auth.total_amount, nonce, deadline)
            .map_err(claim_err)
    }

    async fn query_verify(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<bool> {
        let auth = parse_authorization(&recipient, &amount, nonce, deadline)?;
        // Undecodable hex is just another malformed signature here.
        let Ok(signature) = ClaimSignature::from_hex(&signature) else {
            return Ok(false);
        };
        self.engine()
            .query_verify(&auth.recipient, auth.total_amount, nonce, deadline, &signature)
            .map_err(claim_err)
    }

    async fn query_claimable(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
    ) -> RpcResult<RpcClaimable> {
        let auth = parse_authorization(&recipient, &amount, nonce, deadline)?;
        self.engine()
            .query_claimable(&auth.recipient, auth.total_amount, nonce, deadline, self.now())
            .map(Into::into)
            .map_err(claim_err)
    }

    async fn get_claim_status(
        &self,
        recipient: String,
        amount: String,
        nonce: u64,
        deadline: i64,
    ) -> RpcResult<RpcClaimStatus> {
        let auth = parse_authorization(&recipient, &amount, nonce, deadline)?;
        let query = ClaimQuery::new(&self.engine().db);
        let status = query.state_of(&auth).map_err(claim_err)?;
        let redeemed = query.redeemed(&auth).map_err(claim_err)?;
        let description = query.describe(&auth).map_err(claim_err)?;
        let hash = hash_authorization(&auth).to_hex();
        Ok(RpcClaimStatus::new(hash, status, redeemed, description))
    }

    async fn get_redeemed(&self, recipient: String, amount: String, nonce: u64, deadline: i64) -> RpcResult<String> {
        let auth = parse_authorization(&recipient, &amount, nonce, deadline)?;
        let redeemed = ClaimQuery::new(&self.engine().db).redeemed(&auth).map_err(claim_err)?;
        Ok(redeemed.to_string())
    }

    async fn get_release_schedule(&self, amount: String) -> RpcResult<Vec<RpcRelease>> {
        let amount = parse_amount(&amount)?;
        let releases = self.engine().release_schedule(amount).map_err(claim_err)?;
        Ok(releases.into_iter().map(Into::into).collect())
    }

    async fn get_authorizer(&self) -> RpcResult<String> {
        Ok(self.engine().authorizer().map_err(claim_err)?.to_hex())
    }

    async fn get_owner(&self) -> RpcResult<String> {
        Ok(self.engine().owner().map_err(claim_err)?.to_hex())
    }

    async fn get_vesting_config(&self) -> RpcResult<RpcVestingConfig> {
        let config = self.engine().vesting_config().map_err(claim_err)?;
        Ok(RpcVestingConfig::new(self.engine().schedule().name(), &config))
    }

    async fn get_custody_balance(&self) -> RpcResult<String> {
        Ok(self.engine().custody_balance().map_err(claim_err)?.to_string())
    }

    async fn get_admin_nonce(&self) -> RpcResult<u64> {
        self.engine().admin_nonce().map_err(claim_err)
    }

    async fn rotate_authorizer_key(
        &self,
        new_key: String,
        nonce: u64,
        deadline: i64,
        signature: String,
    ) -> RpcResult<bool> {
        let new_key = parse_address(&new_key)?;
        self.run_admin(AdminAction::RotateAuthorizer { new_key }, nonce, deadline, &signature)?;
        Ok(true)
    }

    async fn set_vesting_start(&self, new_start: i64, nonce: u64, deadline: i64, signature: String) -> RpcResult<bool> {
        self.run_admin(AdminAction::SetVestingStart { new_start }, nonce, deadline, &signature)?;
        Ok(true)
    }

    async fn emergency_drain(&self, amount: String, nonce: u64, deadline: i64, signature: String) -> RpcResult<String> {
        let amount = parse_amount(&amount)?;
        self.run_admin(AdminAction::EmergencyDrain { amount }, nonce, deadline, &signature)?;
        Ok(self.engine().custody_balance().map_err(claim_err)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::http_client::HttpClientBuilder;

    use claimgate_core::authorization::VestingConfig;
    use claimgate_crypto::AuthorizerKeyPair;
    use claimgate_genesis::{apply_genesis, GenesisParams};
    use claimgate_state::{LedgerCustodian, StateDb};
    use claimgate_vesting::{InstantSchedule, PeriodicVestingSchedule};


    const NOW: Timestamp = 1_800_000_000;
    const DAY: i64 = 86_400;

    fn fixed_clock() -> Timestamp {
        NOW
    }

    fn owner_key() -> AuthorizerKeyPair {
        AuthorizerKeyPair::from_secret_bytes(&[0x0a; 32]).unwrap()
    }

    fn owner() -> Address {
        owner_key().address()
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    fn genesis(kp: &AuthorizerKeyPair, vesting: Option<VestingConfig>) -> (Arc<StateDb>, LedgerCustodian) {
        let db = Arc::new(StateDb::temporary().unwrap());
        let params = GenesisParams {
            owner: owner(),
            authorizer: kp.address(),
            custody: Address::from_bytes([0xcc; 20]),
            initial_custody: 10_000,
            vesting,
        };
        let custodian = apply_genesis(&db, &params).unwrap();
        (db, custodian)
    }

    fn instant_server(kp: &AuthorizerKeyPair) -> RpcServer<InstantSchedule, LedgerCustodian> {
        let (db, custodian) = genesis(kp, None);
        let engine = Arc::new(ClaimEngine::new(db, InstantSchedule, custodian));
        RpcServer::new(Arc::new(RpcServerState { engine, clock: fixed_clock }))
    }

    fn vesting_server(kp: &AuthorizerKeyPair) -> RpcServer<PeriodicVestingSchedule, LedgerCustodian> {
        let (db, custodian) = genesis(kp, Some(VestingConfig::new(NOW - DAY, DAY, 4)));
        let engine = Arc::new(ClaimEngine::new(db, PeriodicVestingSchedule, custodian));
        RpcServer::new(Arc::new(RpcServerState { engine, clock: fixed_clock }))
    }

    fn signature_hex(kp: &AuthorizerKeyPair, amount: Amount, nonce: u64, deadline: i64) -> String {
        kp.sign_authorization(&ClaimAuthorization::new(alice(), amount, nonce, deadline))
            .unwrap()
            .to_hex()
    }

    #[tokio::test]
    async fn submit_then_replay() {
        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let sig = signature_hex(&kp, 1_000, 1, NOW + DAY);

        let receipt = server
            .submit_claim(alice().to_hex(), "1000".into(), 1, NOW + DAY, sig.clone())
            .await
            .unwrap();
        assert_eq!(receipt.claimed, "1000");
        assert!(receipt.fully_claimed);
        assert!(server.query_used(alice().to_hex(), "1000".into(), 1, NOW + DAY).await.unwrap());
        assert_eq!(server.get_custody_balance().await.unwrap(), "9000");

        let err = server
            .submit_claim(alice().to_hex(), "1000".into(), 1, NOW + DAY, sig)
            .await
            .unwrap_err();
        assert_eq!(err.code(), CLAIM_REJECTED);
        assert_eq!(err.message(), ClaimError::ReplayedAuthorization.to_string());
    }

    #[tokio::test]
    async fn malformed_params_are_invalid_params() {
        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let err = server.query_used("0x12".into(), "1".into(), 1, NOW).await.unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
        let err = server
            .query_used(alice().to_hex(), "-5".into(), 1, NOW)
            .await
            .unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn verify_reports_false_for_garbage() {
        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let good = signature_hex(&kp, 500, 2, NOW + DAY);
        assert!(server
            .query_verify(alice().to_hex(), "500".into(), 2, NOW + DAY, good)
            .await
            .unwrap());
        for junk in ["0xzz", "0x1234", ""] {
            assert!(!server
                .query_verify(alice().to_hex(), "500".into(), 2, NOW + DAY, junk.into())
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn vesting_status_and_schedule() {
        let kp = AuthorizerKeyPair::generate();
        let server = vesting_server(&kp);
        let deadline = NOW + 30 * DAY;
        let sig = signature_hex(&kp, 1_000, 7, deadline);

        // Clock sits one period past start: two of four periods unlocked.
        let receipt = server
            .submit_claim(alice().to_hex(), "1000".into(), 7, deadline, sig)
            .await
            .unwrap();
        assert_eq!(receipt.claimed, "500");
        assert!(!receipt.fully_claimed);

        let status = server
            .get_claim_status(alice().to_hex(), "1000".into(), 7, deadline)
            .await
            .unwrap();
        assert_eq!(status.state, "partially_claimed");
        assert_eq!(status.redeemed, "500");
        assert_eq!(status.hash, receipt.hash);

        let claimable = server
            .query_claimable(alice().to_hex(), "1000".into(), 7, deadline)
            .await
            .unwrap();
        assert_eq!(claimable.claimable_now, "0");
        assert_eq!(claimable.total_available, "500");

        let schedule = server.get_release_schedule("1000".into()).await.unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[3].cumulative, "1000");

        let cfg = server.get_vesting_config().await.unwrap();
        assert_eq!(cfg.schedule, "vesting");
        assert_eq!(cfg.period_count, 4);
    }

    fn owner_signature(signer: &AuthorizerKeyPair, action: AdminAction, nonce: u64) -> String {
        signer
            .sign_admin_command(&AdminCommand::new(action, nonce, NOW + DAY))
            .unwrap()
            .to_hex()
    }

    #[tokio::test]
    async fn owner_operations_need_owner_signature() {
        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let intruder = AuthorizerKeyPair::generate();
        let takeover = AdminAction::RotateAuthorizer { new_key: intruder.address() };

        // Reading the owner address grants nothing.
        assert_eq!(server.get_owner().await.unwrap(), owner().to_hex());
        let forged = owner_signature(&intruder, takeover, 0);
        let err = server
            .rotate_authorizer_key(intruder.address().to_hex(), 0, NOW + DAY, forged)
            .await
            .unwrap_err();
        assert_eq!(err.code(), CLAIM_REJECTED);
        assert_eq!(err.message(), ClaimError::Unauthorized.to_string());
        assert_eq!(server.get_authorizer().await.unwrap(), kp.address().to_hex());

        let own = intruder
            .sign_authorization(&ClaimAuthorization::new(intruder.address(), 10_000, 1, NOW + DAY))
            .unwrap()
            .to_hex();
        assert!(server
            .submit_claim(intruder.address().to_hex(), "10000".into(), 1, NOW + DAY, own)
            .await
            .is_err());
        assert_eq!(server.get_custody_balance().await.unwrap(), "10000");
    }

    #[tokio::test]
    async fn owner_operations() {
        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let next = AuthorizerKeyPair::generate();
        let owner = owner_key();

        assert_eq!(server.get_admin_nonce().await.unwrap(), 0);
        let rotate = AdminAction::RotateAuthorizer { new_key: next.address() };
        let sig = owner_signature(&owner, rotate, 0);
        assert!(server
            .rotate_authorizer_key(next.address().to_hex(), 0, NOW + DAY, sig.clone())
            .await
            .unwrap());
        assert_eq!(server.get_authorizer().await.unwrap(), next.address().to_hex());
        assert_eq!(server.get_admin_nonce().await.unwrap(), 1);

        let err = server
            .rotate_authorizer_key(next.address().to_hex(), 0, NOW + DAY, sig)
            .await
            .unwrap_err();
        assert_eq!(err.message(), ClaimError::StaleAdminNonce { expected: 1, got: 0 }.to_string());

        let drain = owner_signature(&owner, AdminAction::EmergencyDrain { amount: 2_500 }, 1);
        let left = server.emergency_drain("2500".into(), 1, NOW + DAY, drain).await.unwrap();
        assert_eq!(left, "7500");

        let err = server
            .emergency_drain("1".into(), 2, NOW + DAY, "0xzz".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
    }

    #[test]
    fn cors_admits_only_listed_origins() {
        assert!(!origin_allowed(&[], b"http://evil.example"));
        let allowed = vec!["https://wallet.example".to_string()];
        assert!(origin_allowed(&allowed, b"https://wallet.example"));
        assert!(!origin_allowed(&allowed, b"https://wallet.example.evil"));
        assert!(!origin_allowed(&allowed, b"null"));
    }

    #[tokio::test]
    async fn serves_over_http() {
        use crate::api::ClaimgateApiClient;

        let kp = AuthorizerKeyPair::generate();
        let server = instant_server(&kp);
        let (addr, handle) = server.start("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let client = HttpClientBuilder::default()
            .build(format!("http://{addr}"))
            .unwrap();
        let authorizer = client.get_authorizer().await.unwrap();
        assert_eq!(authorizer, kp.address().to_hex());

        let sig = signature_hex(&kp, 42, 9, NOW + DAY);
        let receipt = client
            .submit_claim(alice().to_hex(), "42".into(), 9, NOW + DAY, sig)
            .await
            .unwrap();
        assert_eq!(receipt.cumulative, "42");

        handle.stop().unwrap();
    }
}
