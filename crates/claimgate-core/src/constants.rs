/// ─── ClaimGate Protocol Constants ───────────────────────────────────────────
///
/// Wire-level constants shared by the off-chain issuer and the redemption
/// engine. Changing any of these breaks every outstanding authorization.

// ── Signatures ───────────────────────────────────────────────────────────────

/// r (32) ‖ s (32) ‖ v (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// Recovery byte offset used by issuers: v = 27 + recovery id.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// Standard message-signing prefix for a 32-byte payload.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

// ── Packed authorization encoding ────────────────────────────────────────────

/// Width of the recipient address field.
pub const ADDRESS_LENGTH: usize = 20;

/// Width of every integer field (uint256).
pub const WORD_LENGTH: usize = 32;

/// recipient ‖ total_amount ‖ nonce ‖ deadline.
pub const PACKED_AUTHORIZATION_LENGTH: usize = ADDRESS_LENGTH + 3 * WORD_LENGTH;

// ── Owner commands ───────────────────────────────────────────────────────────

/// Opens every packed owner command so it can never collide with an
/// authorization encoding.
pub const ADMIN_DOMAIN_TAG: &[u8] = b"claimgate.admin.v1";

/// tag ‖ action (1) ‖ argument ‖ nonce ‖ deadline.
pub const PACKED_ADMIN_COMMAND_LENGTH: usize = ADMIN_DOMAIN_TAG.len() + 1 + 3 * WORD_LENGTH;

// ── Vesting ───────────────────────────────────────────────────────────────────

/// Largest accepted `period_count`. Bounds the release schedule listing.
pub const MAX_VESTING_PERIODS: u32 = 10_000;

/// Default number of vesting periods when genesis params omit it.
pub const DEFAULT_VESTING_PERIODS: u32 = 4;

/// Default period length (seconds). 30 days.
pub const DEFAULT_VESTING_PERIOD_SECS: i64 = 30 * 24 * 3600;
