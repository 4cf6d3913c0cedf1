//! claimgate-node: serves a claim engine over JSON-RPC.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Build the claim engine for the selected schedule
//!   4. Start the JSON-RPC 2.0 server and run until Ctrl-C

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use claimgate_core::types::Address;
use claimgate_crypto::AuthorizerKeyPair;
use claimgate_genesis::{apply_genesis, is_initialized, GenesisParams};
use claimgate_rpc::{RpcServer, RpcServerState};
use claimgate_state::{ClaimEngine, Custodian, LedgerCustodian, StateDb};
use claimgate_vesting::{InstantSchedule, PeriodicVestingSchedule, UnlockSchedule};

/// Used only when genesis params are generated on the fly.
const DEV_CUSTODY: Address = Address([0xcc; 20]);

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Each authorization pays out in full on its first claim.
    Instant,
    /// Authorizations unlock per the stored vesting config.
    Vesting,
}

#[derive(Parser, Debug)]
#[command(
    name = "claimgate-node",
    version,
    about = "ClaimGate node: redeem signed claim authorizations"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.claimgate/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only read on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Unlock schedule applied to every authorization.
    #[arg(long, value_enum, default_value_t = Mode::Instant)]
    mode: Mode,

    /// Browser origin allowed to call the RPC server. Repeatable; none by default.
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,claimgate=debug")),
        )
        .init();

    let args = Args::parse();
    info!(mode = ?args.mode, "ClaimGate node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    let custodian = if !is_initialized(&db).context("reading genesis marker")? {
        info!("fresh database: applying genesis");
        let params = load_or_generate_genesis_params(args.genesis_params.as_deref())?;
        if args.mode == Mode::Vesting && params.vesting.is_none() {
            warn!("vesting mode without a vesting config: every authorization unlocks immediately");
        }
        apply_genesis(&db, &params).context("applying genesis")?
    } else {
        info!("existing database found: skipping genesis");
        let custody = db
            .custody()
            .context("reading custody address")?
            .context("database has an owner but no custody address")?;
        LedgerCustodian::new(Arc::clone(&db), custody)
    };
    info!(
        custody = %custodian.holder(),
        balance = custodian.balance_of(&custodian.holder()).context("reading custody balance")?,
        "custodian ready"
    );

    // ── Engine + RPC ──────────────────────────────────────────────────────────
    match args.mode {
        Mode::Instant => serve(db, InstantSchedule, custodian, args.rpc_addr, args.cors_origins).await,
        Mode::Vesting => serve(db, PeriodicVestingSchedule, custodian, args.rpc_addr, args.cors_origins).await,
    }
}

async fn serve<S: UnlockSchedule, C: Custodian + 'static>(
    db: Arc<StateDb>,
    schedule: S,
    custodian: C,
    rpc_addr: SocketAddr,
    cors_origins: Vec<String>,
) -> anyhow::Result<()> {
    let engine = Arc::new(ClaimEngine::new(Arc::clone(&db), schedule, custodian));
    let authorizer = engine.authorizer().context("reading authorizer key")?;
    let admin_nonce = engine.admin_nonce().context("reading owner command nonce")?;
    info!(schedule = engine.schedule().name(), %authorizer, admin_nonce, "claim engine ready");

    let rpc_state = Arc::new(RpcServerState::new(engine));
    let (bound, handle) = RpcServer::new(rpc_state)
        .with_cors_origins(cors_origins)
        .start(rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(rpc = %bound, "node ready");
    tokio::select! {
        _ = handle.clone().stopped() => warn!("RPC server stopped"),
        res = tokio::signal::ctrl_c() => {
            res.context("waiting for Ctrl-C")?;
            info!("shutdown requested");
            let _ = handle.stop();
        }
    }

    db.flush().context("flushing state database")?;
    info!("state flushed");
    Ok(())
}

fn load_genesis_params(path: &Path) -> anyhow::Result<GenesisParams> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading genesis params from {}", path.display()))?;
    GenesisParams::from_json(&json).context("parsing genesis params JSON")
}

/// Load genesis parameters from a JSON file, or generate ephemeral owner and
/// authorizer keys if no path is given.
///
/// # Warning
/// The ephemeral secrets are printed to the log once and never stored. Without
/// them nobody can sign authorizations or owner commands for this database.
/// Local development only.
fn load_or_generate_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        return load_genesis_params(p);
    }
    warn!("No --genesis-params provided. Generating ephemeral keys. DO NOT USE IN PRODUCTION.");
    let owner = AuthorizerKeyPair::generate();
    let owner_secret = owner.secret_hex();
    warn!(address = %owner.address(), secret = %owner_secret.as_str(), "ephemeral owner key");
    let authorizer = AuthorizerKeyPair::generate();
    let secret = authorizer.secret_hex();
    warn!(address = %authorizer.address(), secret = %secret.as_str(), "ephemeral authorizer key");
    Ok(GenesisParams {
        owner: owner.address(),
        authorizer: authorizer.address(),
        custody: DEV_CUSTODY,
        initial_custody: 1_000_000,
        vesting: None,
    })
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
