use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount of the redeemable resource in base units.
pub type Amount = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Issuer-chosen nonce distinguishing otherwise identical authorizations.
pub type Nonce = u64;

/// Decode an optionally `0x`-prefixed hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let mut arr = [0u8; N];
    hex::decode_to_slice(s, &mut arr)?;
    Ok(arr)
}

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte principal identifier: last 20 bytes of Keccak-256 over an
/// uncompressed secp256k1 public key (without the 0x04 tag).
///
/// Serialized as a `0x`-prefixed hex string so genesis files stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero placeholder principal. Rejected wherever an admin supplies an address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Address {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

// ── MessageHash ──────────────────────────────────────────────────────────────

/// 32-byte canonical digest of a `ClaimAuthorization`. Identifies the
/// authorization in the replay tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageHash(pub [u8; 32]);

impl MessageHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl TryFrom<String> for MessageHash {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<MessageHash> for String {
    fn from(h: MessageHash) -> String {
        h.to_hex()
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageHash({}…)", &self.to_hex()[..18])
    }
}

// ── ClaimSignature ───────────────────────────────────────────────────────────

/// Raw recoverable ECDSA signature as submitted by the caller.
///
/// Length is deliberately unchecked here; the verifier rejects anything
/// other than 65 bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSignature(pub Vec<u8>);

impl ClaimSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(s).map(Self)
    }
}

impl fmt::Debug for ClaimSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimSignature({}b)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_accepts_optional_prefix() {
        let a = Address::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        let b = Address::from_hex("00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.0[19], 0xff);
        assert_eq!(a.to_hex(), "0x00000000000000000000000000000000000000ff");
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!(Address::from_hex("0x1234").is_err());
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let a = Address::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn zero_address_detected() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_bytes([1; 20]).is_zero());
    }
}
