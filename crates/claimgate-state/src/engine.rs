use std::sync::Arc;

use claimgate_core::authorization::{
    AdminAction, AdminCommand, ClaimAuthorization, ClaimReceipt, ClaimableInfo, VestingConfig,
};
use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, Amount, ClaimSignature, MessageHash, Nonce, Timestamp};
use claimgate_crypto::{hash_admin_command, hash_authorization, verify};
use claimgate_vesting::{release_schedule, Release, UnlockSchedule};
use tracing::{error, info, warn};

use crate::custodian::Custodian;
use crate::db::StateDb;
use crate::guard::CallGuard;
use crate::replay::ReplayGuard;

// ── ClaimEngine ───────────────────────────────────────────────────────────────

/// The redemption engine.
///
/// Validates signed authorizations and releases funds through the custodian.
/// Each mutating call is atomic: either every check passes and all state
/// changes persist, or the call fails and nothing changes. Replay state is
/// written before the custodian is asked to move funds, and every mutating
/// call runs under a single non-reentrant guard.
pub struct ClaimEngine<S, C> {
    pub db: Arc<StateDb>,
    schedule: S,
    custodian: C,
    guard: CallGuard,
}

impl<S: UnlockSchedule, C: Custodian> ClaimEngine<S, C> {
    pub fn new(db: Arc<StateDb>, schedule: S, custodian: C) -> Self {
        Self { db, schedule, custodian, guard: CallGuard::new() }
    }

    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    pub fn custodian(&self) -> &C {
        &self.custodian
    }

    /// Key currently trusted to sign authorizations.
    pub fn authorizer(&self) -> Result<Address, ClaimError> {
        self.db.authorizer()?.ok_or(ClaimError::NotInitialized("authorizer"))
    }

    pub fn owner(&self) -> Result<Address, ClaimError> {
        self.db.owner()?.ok_or(ClaimError::NotInitialized("owner"))
    }

    /// Stored vesting config, or the immediate schedule when none was set.
    pub fn vesting_config(&self) -> Result<VestingConfig, ClaimError> {
        Ok(self.db.vesting_config()?.unwrap_or_else(VestingConfig::immediate))
    }

    // ── Claims ────────────────────────────────────────────────────────────────

    /// Redeem whatever `caller` is currently entitled to under the
    /// authorization (caller, total_amount, nonce, deadline).
    pub fn submit_claim(
        &self,
        caller: &Address,
        total_amount: Amount,
        nonce: Nonce,
        deadline: Timestamp,
        signature: &ClaimSignature,
        now: Timestamp,
    ) -> Result<ClaimReceipt, ClaimError> {
        let _entered = self.guard.enter()?;
        let auth = ClaimAuthorization::new(*caller, total_amount, nonce, deadline);

        // ── Validation ────────────────────────────────────────────────────────
        if auth.is_expired(now) {
            return Err(ClaimError::ExpiredAuthorization { deadline });
        }
        if total_amount == 0 {
            return Err(ClaimError::ZeroAmount);
        }
        let config = self.vesting_config()?;
        if let Some(start) = self.schedule.start(&config) {
            if now < start {
                return Err(ClaimError::VestingNotStarted { start });
            }
        }

        let hash = hash_authorization(&auth);
        self.check_signature(&hash, signature)?;

        let replay = ReplayGuard::new(&self.db);
        if replay.is_fully_used(&hash)? {
            return Err(ClaimError::ReplayedAuthorization);
        }

        let unlocked = self.schedule.unlocked(total_amount, now, &config);
        let redeemed = replay.redeemed_amount(caller, &hash)?;
        let claimable = unlocked.saturating_sub(redeemed);
        if claimable == 0 {
            return Err(ClaimError::NothingToClaim);
        }

        let custody = self.custodian.balance_of(&self.custodian.holder())?;
        if custody < claimable {
            return Err(ClaimError::InsufficientCustody { need: claimable, have: custody });
        }

        // ── Effects ───────────────────────────────────────────────────────────
        let snapshot = replay.snapshot(caller, &hash)?;
        let cumulative = redeemed + claimable;
        let fully_claimed = cumulative == total_amount;
        // One transaction: on error nothing was written.
        replay.record_redemption(caller, &hash, cumulative, fully_claimed)?;

        // ── Interaction ───────────────────────────────────────────────────────
        let transferred = match self.custodian.transfer(caller, claimable) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "custodian transfer errored");
                false
            }
        };
        if !transferred {
            match replay.restore(&snapshot) {
                Ok(()) => {
                    warn!(recipient = %caller, amount = claimable, %hash, "claim rolled back: transfer failed")
                }
                Err(e) => error!(
                    recipient = %caller,
                    %hash,
                    recorded = cumulative,
                    restore_to = ?snapshot.redeemed,
                    error = %e,
                    "transfer failed and replay state could not be restored"
                ),
            }
            return Err(ClaimError::TransferFailed);
        }

        let receipt = ClaimReceipt {
            recipient: *caller,
            claimed: claimable,
            cumulative,
            hash,
            fully_claimed,
        };
        info!(
            recipient = %receipt.recipient,
            claimed = receipt.claimed,
            cumulative = receipt.cumulative,
            hash = %receipt.hash,
            schedule = self.schedule.name(),
            "claim redeemed"
        );
        Ok(receipt)
    }

    /// Signature check shared by `submit_claim` and `query_verify`.
    fn check_signature(&self, hash: &MessageHash, signature: &ClaimSignature) -> Result<(), ClaimError> {
        let authorizer = self.authorizer()?;
        if verify(hash, signature.as_bytes(), &authorizer)? {
            Ok(())
        } else {
            Err(ClaimError::SignatureMismatch)
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn query_used(
        &self,
        recipient: &Address,
        amount: Amount,
        nonce: Nonce,
        deadline: Timestamp,
    ) -> Result<bool, ClaimError> {
        let hash = hash_authorization(&ClaimAuthorization::new(*recipient, amount, nonce, deadline));
        self.db.is_used(&hash)
    }

    /// Whether `signature` is a valid authorizer signature for these fields.
    /// Malformed signatures report `false`.
    pub fn query_verify(
        &self,
        recipient: &Address,
        amount: Amount,
        nonce: Nonce,
        deadline: Timestamp,
        signature: &ClaimSignature,
    ) -> Result<bool, ClaimError> {
        let hash = hash_authorization(&ClaimAuthorization::new(*recipient, amount, nonce, deadline));
        match self.check_signature(&hash, signature) {
            Ok(()) => Ok(true),
            Err(ClaimError::SignatureMismatch | ClaimError::InvalidSignatureLength { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// What the authorization could release at `now`, ignoring custody.
    /// Expired authorizations report nothing claimable.
    pub fn query_claimable(
        &self,
        recipient: &Address,
        total_amount: Amount,
        nonce: Nonce,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<ClaimableInfo, ClaimError> {
        let auth = ClaimAuthorization::new(*recipient, total_amount, nonce, deadline);
        let hash = hash_authorization(&auth);
        let config = self.vesting_config()?;

        let total_available = self.schedule.unlocked(total_amount, now, &config);
        let already_claimed = ReplayGuard::new(&self.db).redeemed_amount(recipient, &hash)?;
        let claimable_now = if auth.is_expired(now) || self.db.is_used(&hash)? {
            0
        } else {
            total_available.saturating_sub(already_claimed)
        };

        Ok(ClaimableInfo { claimable_now, already_claimed, total_available })
    }

    /// Release steps an authorization of `total_amount` follows under this
    /// engine's schedule. One-shot engines report a single step.
    pub fn release_schedule(&self, total_amount: Amount) -> Result<Vec<Release>, ClaimError> {
        let config = self.vesting_config()?;
        config.validate()?;
        Ok(match self.schedule.start(&config) {
            Some(_) => release_schedule(total_amount, &config),
            None => release_schedule(total_amount, &VestingConfig::immediate()),
        })
    }

    pub fn custody_balance(&self) -> Result<Amount, ClaimError> {
        self.custodian.balance_of(&self.custodian.holder())
    }

    // ── Administration ────────────────────────────────────────────────────────

    fn require_owner(&self, caller: &Address) -> Result<(), ClaimError> {
        if *caller != self.owner()? {
            return Err(ClaimError::Unauthorized);
        }
        Ok(())
    }

    /// Nonce the next owner command must carry.
    pub fn admin_nonce(&self) -> Result<Nonce, ClaimError> {
        self.db.admin_nonce()
    }

    /// Run a command signed by the owner key. This is the entry point for
    /// callers whose identity cannot be trusted, such as the RPC server.
    ///
    /// The command must be unexpired and carry the current admin nonce. The
    /// nonce is consumed as soon as the signature checks out, so a command
    /// whose action is then rejected cannot be retried either.
    pub fn execute_admin(
        &self,
        command: &AdminCommand,
        signature: &ClaimSignature,
        now: Timestamp,
    ) -> Result<(), ClaimError> {
        let _entered = self.guard.enter()?;
        if command.is_expired(now) {
            return Err(ClaimError::ExpiredAdminCommand { deadline: command.deadline });
        }
        let expected = self.db.admin_nonce()?;
        if command.nonce != expected {
            return Err(ClaimError::StaleAdminNonce { expected, got: command.nonce });
        }
        let owner = self.owner()?;
        let hash = hash_admin_command(command);
        if !verify(&hash, signature.as_bytes(), &owner)? {
            warn!(action = command.action.name(), nonce = command.nonce, "owner command with foreign signature");
            return Err(ClaimError::Unauthorized);
        }
        let next = expected
            .checked_add(1)
            .ok_or_else(|| ClaimError::Storage("owner command nonce exhausted".into()))?;
        self.db.put_admin_nonce(next)?;

        info!(action = command.action.name(), nonce = command.nonce, %hash, "owner command accepted");
        match command.action {
            AdminAction::RotateAuthorizer { new_key } => self.apply_rotation(&new_key),
            AdminAction::SetVestingStart { new_start } => self.apply_vesting_start(new_start, now),
            AdminAction::EmergencyDrain { amount } => self.apply_drain(&owner, amount),
        }
    }

    /// Replace the trusted authorizer key. Every outstanding authorization
    /// signed by the previous key stops verifying immediately.
    pub fn rotate_authorizer_key(&self, caller: &Address, new_key: &Address) -> Result<(), ClaimError> {
        let _entered = self.guard.enter()?;
        self.require_owner(caller)?;
        self.apply_rotation(new_key)
    }

    /// Move the vesting start. Only allowed while the current start is
    /// still in the future, and never to a time already past.
    pub fn set_vesting_start(&self, caller: &Address, new_start: Timestamp, now: Timestamp) -> Result<(), ClaimError> {
        let _entered = self.guard.enter()?;
        self.require_owner(caller)?;
        self.apply_vesting_start(new_start, now)
    }

    /// Pull `amount` out of custody to the owner.
    pub fn emergency_drain(&self, caller: &Address, amount: Amount) -> Result<(), ClaimError> {
        let _entered = self.guard.enter()?;
        self.require_owner(caller)?;
        self.apply_drain(caller, amount)
    }

    fn apply_rotation(&self, new_key: &Address) -> Result<(), ClaimError> {
        if new_key.is_zero() {
            return Err(ClaimError::InvalidAddress);
        }
        let previous = self.db.authorizer()?;
        self.db.put_authorizer(new_key)?;
        info!(previous = ?previous, new = %new_key, "authorizer key rotated");
        Ok(())
    }

    fn apply_vesting_start(&self, new_start: Timestamp, now: Timestamp) -> Result<(), ClaimError> {
        let mut config = self
            .db
            .vesting_config()?
            .ok_or(ClaimError::NotInitialized("vesting config"))?;
        if now >= config.start {
            return Err(ClaimError::VestingAlreadyStarted);
        }
        if new_start < now {
            return Err(ClaimError::InvalidVestingConfig("start must not be in the past".into()));
        }
        let previous = config.start;
        config.start = new_start;
        self.db.put_vesting_config(&config)?;
        info!(previous, new_start, "vesting start moved");
        Ok(())
    }

    fn apply_drain(&self, owner: &Address, amount: Amount) -> Result<(), ClaimError> {
        if amount == 0 {
            return Err(ClaimError::ZeroAmount);
        }
        let have = self.custody_balance()?;
        if have < amount {
            return Err(ClaimError::InsufficientCustody { need: amount, have });
        }
        if !self.custodian.transfer(owner, amount)? {
            return Err(ClaimError::TransferFailed);
        }
        warn!(%owner, amount, "custody drained");
        Ok(())
    }
}
