use claimgate_core::authorization::{AdminCommand, ClaimAuthorization};
use claimgate_core::constants::RECOVERY_ID_OFFSET;
use claimgate_core::types::{Address, ClaimSignature, MessageHash};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::codec::{hash_admin_command, hash_authorization};
use crate::signature::{address_from_key, prefixed_digest, SignatureError};

/// A secp256k1 authorizer key with its derived address.
///
/// Issuance itself lives off-chain; this type exists for key tooling and so
/// tests can produce authorizations the engine accepts.
/// `SigningKey` wipes its scalar on drop.
pub struct AuthorizerKeyPair {
    signing_key: SigningKey,
    address: Address,
}

impl AuthorizerKeyPair {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Restore from a 32-byte big-endian secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Restore from a hex-encoded secret, `0x` prefix optional.
    pub fn from_secret_hex(s: &str) -> Result<Self, SignatureError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(hex::decode(s).map_err(|_| SignatureError::InvalidSecretKey)?);
        Self::from_secret_bytes(&bytes)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_key(signing_key.verifying_key());
        Self { signing_key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Hex-encoded secret scalar. The returned buffer is wiped on drop.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_bytes().to_vec());
        Zeroizing::new(format!("0x{}", hex::encode(&*bytes)))
    }

    /// Sign `hash` under the standard message prefix, producing `r ‖ s ‖ v`
    /// with `v ∈ {27, 28}`.
    pub fn sign_hash(&self, hash: &MessageHash) -> Result<ClaimSignature, SignatureError> {
        let digest = prefixed_digest(hash);
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|_| SignatureError::SigningFailed)?;
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&sig.to_bytes());
        out.push(recid.to_byte() + RECOVERY_ID_OFFSET);
        Ok(ClaimSignature(out))
    }

    /// Sign the canonical hash of `auth`.
    pub fn sign_authorization(&self, auth: &ClaimAuthorization) -> Result<ClaimSignature, SignatureError> {
        self.sign_hash(&hash_authorization(auth))
    }

    /// Sign an owner command. Only meaningful when this key is the owner.
    pub fn sign_admin_command(&self, cmd: &AdminCommand) -> Result<ClaimSignature, SignatureError> {
        self.sign_hash(&hash_admin_command(cmd))
    }
}

impl std::fmt::Debug for AuthorizerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorizerKeyPair {{ address: {} }}", self.address)
    }
}
