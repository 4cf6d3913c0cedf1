//! claimgate-keygen
//!
//! Issuer-side tooling: create authorizer and owner keys, sign claim
//! authorizations and owner commands offline.
//!
//! Usage:
//!   claimgate-keygen generate   [--keyfile <path>]
//!   claimgate-keygen sign       --recipient <0x..> --amount <n> --nonce <n> --deadline <unix_ts> [--keyfile <path>]
//!   claimgate-keygen sign-admin <rotate-authorizer|set-vesting-start|emergency-drain> ... --nonce <n> --deadline <unix_ts>
//!   claimgate-keygen address    [--keyfile <path>]
//!
//! `sign-admin` must use the owner's keyfile; the nonce is whatever
//! `claimgate_getAdminNonce` reports.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use claimgate_core::authorization::{AdminAction, AdminCommand, ClaimAuthorization};
use claimgate_core::types::{Address, Amount, Nonce, Timestamp};
use claimgate_crypto::{hash_admin_command, hash_authorization, AuthorizerKeyPair};

#[derive(Parser, Debug)]
#[command(
    name = "claimgate-keygen",
    version,
    about = "ClaimGate key tool: generate authorizer keys and sign authorizations"
)]
struct Args {
    /// Path to the authorizer keyfile (JSON).
    #[arg(long, global = true, default_value = "~/.claimgate/authorizer.json")]
    keyfile: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new secp256k1 authorizer key and save it to the keyfile.
    Generate,

    /// Print the address of the key in the keyfile.
    Address,

    /// Sign an authorization and print the 65-byte signature.
    Sign {
        /// Recipient address (0x-prefixed hex).
        #[arg(long)]
        recipient: String,
        /// Total amount the recipient may redeem.
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        nonce: Nonce,
        /// Last unix timestamp (seconds) at which the claim is accepted.
        #[arg(long)]
        deadline: Timestamp,
    },

    /// Sign an owner command with the owner key in the keyfile.
    SignAdmin {
        #[command(subcommand)]
        action: AdminArg,
    },
}

#[derive(Subcommand, Debug)]
enum AdminArg {
    /// Replace the trusted authorizer key.
    RotateAuthorizer {
        #[arg(long)]
        new_key: String,
        #[command(flatten)]
        window: CommandWindow,
    },
    /// Move the vesting start (only before it is reached).
    SetVestingStart {
        #[arg(long)]
        new_start: Timestamp,
        #[command(flatten)]
        window: CommandWindow,
    },
    /// Pay `amount` out of custody to the owner.
    EmergencyDrain {
        #[arg(long)]
        amount: Amount,
        #[command(flatten)]
        window: CommandWindow,
    },
}

#[derive(ClapArgs, Debug)]
struct CommandWindow {
    /// Current owner command nonce.
    #[arg(long)]
    nonce: Nonce,
    /// Last unix timestamp (seconds) at which the command is accepted.
    #[arg(long)]
    deadline: Timestamp,
}

/// On-disk keyfile. The address is stored for reference only and checked
/// against the secret on load.
#[derive(Serialize, Deserialize)]
struct Keyfile {
    address: Address,
    secret_key: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let keyfile = expand_tilde(&args.keyfile);

    match args.command {
        Command::Generate => cmd_generate(&keyfile),
        Command::Address => {
            let kp = load_keypair(&keyfile)?;
            println!("{}", kp.address());
            Ok(())
        }
        Command::Sign { recipient, amount, nonce, deadline } => {
            cmd_sign(&keyfile, &recipient, amount, nonce, deadline)
        }
        Command::SignAdmin { action } => cmd_sign_admin(&keyfile, action),
    }
}

fn cmd_generate(keyfile: &Path) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kp = AuthorizerKeyPair::generate();
    let file = Keyfile { address: kp.address(), secret_key: kp.secret_hex().to_string() };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(keyfile, &json)
        .with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    println!("Generated new authorizer key.");
    println!("Address: {}", kp.address());
    println!("Keyfile: {}", keyfile.display());
    println!("\nPut the address in genesis-params.json as \"authorizer\" (or \"owner\"). Keep the keyfile offline.");
    Ok(())
}

fn cmd_sign(
    keyfile: &Path,
    recipient: &str,
    amount: Amount,
    nonce: Nonce,
    deadline: Timestamp,
) -> anyhow::Result<()> {
    let kp = load_keypair(keyfile)?;
    let recipient = Address::from_hex(recipient).context("parsing recipient address")?;
    if amount == 0 {
        bail!("amount must be greater than zero");
    }

    let auth = ClaimAuthorization::new(recipient, amount, nonce, deadline);
    let signature = kp.sign_authorization(&auth).context("signing authorization")?;

    println!("hash:      {}", hash_authorization(&auth));
    println!("signer:    {}", kp.address());
    println!("signature: {}", signature.to_hex());
    Ok(())
}

fn cmd_sign_admin(keyfile: &Path, arg: AdminArg) -> anyhow::Result<()> {
    let kp = load_keypair(keyfile)?;
    let (action, window) = match arg {
        AdminArg::RotateAuthorizer { new_key, window } => {
            let new_key = Address::from_hex(&new_key).context("parsing new authorizer key")?;
            (AdminAction::RotateAuthorizer { new_key }, window)
        }
        AdminArg::SetVestingStart { new_start, window } => (AdminAction::SetVestingStart { new_start }, window),
        AdminArg::EmergencyDrain { amount, window } => (AdminAction::EmergencyDrain { amount }, window),
    };

    let command = AdminCommand::new(action, window.nonce, window.deadline);
    let signature = kp.sign_admin_command(&command).context("signing owner command")?;

    println!("action:    {}", action.name());
    println!("hash:      {}", hash_admin_command(&command));
    println!("signer:    {}", kp.address());
    println!("signature: {}", signature.to_hex());
    Ok(())
}

fn load_keypair(keyfile: &Path) -> anyhow::Result<AuthorizerKeyPair> {
    let json = std::fs::read_to_string(keyfile)
        .with_context(|| format!("reading keyfile {}", keyfile.display()))?;
    let file: Keyfile =
        serde_json::from_str(&json).context("parsing keyfile: is it a valid ClaimGate keyfile?")?;
    let kp = AuthorizerKeyPair::from_secret_hex(&file.secret_key).context("decoding secret key")?;
    if kp.address() != file.address {
        bail!("keyfile address {} does not match its secret key ({})", file.address, kp.address());
    }
    Ok(kp)
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
