use claimgate_core::constants::{RECOVERY_ID_OFFSET, SIGNATURE_LENGTH, SIGNED_MESSAGE_PREFIX};
use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, MessageHash};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use thiserror::Error;

use crate::codec::keccak256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("signing failed")]
    SigningFailed,
}

impl From<SignatureError> for ClaimError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::InvalidSignatureLength { got, .. } => {
                ClaimError::InvalidSignatureLength { got }
            }
            _ => ClaimError::SignatureMismatch,
        }
    }
}

/// Domain-separated digest that issuers actually sign:
/// Keccak-256(prefix ‖ hash).
pub fn prefixed_digest(hash: &MessageHash) -> [u8; 32] {
    let mut buf = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + 32);
    buf.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    buf.extend_from_slice(hash.as_bytes());
    keccak256(&buf)
}

/// Derive the 20-byte address of a secp256k1 public key.
pub fn address_from_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed tag.
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&digest[12..]);
    Address::from_bytes(arr)
}

/// Recover the signer of `hash` from a 65-byte `r ‖ s ‖ v` signature.
///
/// Returns `Ok(None)` when the triple does not recover to a key: unknown `v`,
/// out-of-range or high `s`, or `r` not on the curve.
pub fn recover_signer(hash: &MessageHash, signature: &[u8]) -> Result<Option<Address>, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            got: signature.len(),
        });
    }

    let recid = match signature[64] {
        v @ (27 | 28) => RecoveryId::from_byte(v - RECOVERY_ID_OFFSET),
        _ => None,
    };
    let Some(recid) = recid else { return Ok(None) };

    let Ok(sig) = Signature::from_slice(&signature[..64]) else { return Ok(None) };

    let digest = prefixed_digest(hash);
    Ok(VerifyingKey::recover_from_prehash(&digest, &sig, recid)
        .ok()
        .map(|key| address_from_key(&key)))
}

/// True iff `signature` over `hash` recovers to `expected`.
pub fn verify(hash: &MessageHash, signature: &[u8], expected: &Address) -> Result<bool, SignatureError> {
    Ok(recover_signer(hash, signature)?.as_ref() == Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::AuthorizerKeyPair;

    fn hash() -> MessageHash {
        MessageHash::from_bytes(keccak256(b"claimgate test payload"))
    }

    #[test]
    fn sign_verify_round_trip() {
        let kp = AuthorizerKeyPair::generate();
        let sig = kp.sign_hash(&hash()).unwrap();
        assert_eq!(sig.0.len(), 65);
        assert!(verify(&hash(), &sig.0, &kp.address()).unwrap());
        assert_eq!(recover_signer(&hash(), &sig.0).unwrap(), Some(kp.address()));
    }

    #[test]
    fn wrong_length_is_an_error() {
        let kp = AuthorizerKeyPair::generate();
        let sig = kp.sign_hash(&hash()).unwrap();
        assert_eq!(
            verify(&hash(), &sig.0[..64], &kp.address()),
            Err(SignatureError::InvalidSignatureLength { expected: 65, got: 64 })
        );
        let mut long = sig.0.clone();
        long.push(0);
        assert!(verify(&hash(), &long, &kp.address()).is_err());
    }

    #[test]
    fn every_single_bit_flip_of_signature_fails() {
        let kp = AuthorizerKeyPair::generate();
        let sig = kp.sign_hash(&hash()).unwrap();
        for byte in 0..65 {
            for bit in 0..8 {
                let mut tampered = sig.0.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    !verify(&hash(), &tampered, &kp.address()).unwrap(),
                    "flip of byte {byte} bit {bit} still verified"
                );
            }
        }
    }

    #[test]
    fn every_single_bit_flip_of_hash_fails() {
        let kp = AuthorizerKeyPair::generate();
        let sig = kp.sign_hash(&hash()).unwrap();
        for byte in 0..32 {
            for bit in 0..8 {
                let mut h = *hash().as_bytes();
                h[byte] ^= 1 << bit;
                assert!(!verify(&MessageHash::from_bytes(h), &sig.0, &kp.address()).unwrap());
            }
        }
    }

    #[test]
    fn other_key_does_not_match() {
        let signer = AuthorizerKeyPair::generate();
        let other = AuthorizerKeyPair::generate();
        let sig = signer.sign_hash(&hash()).unwrap();
        assert!(!verify(&hash(), &sig.0, &other.address()).unwrap());
    }

    #[test]
    fn garbage_signature_is_non_match_not_error() {
        let kp = AuthorizerKeyPair::generate();
        assert_eq!(verify(&hash(), &[0u8; 65], &kp.address()), Ok(false));
        let mut junk = [0xffu8; 65];
        junk[64] = 27;
        assert_eq!(verify(&hash(), &junk, &kp.address()), Ok(false));
    }

    #[test]
    fn known_key_derives_known_address() {
        let mut sk = [0u8; 32];
        sk[31] = 1;
        let kp = AuthorizerKeyPair::from_secret_bytes(&sk).unwrap();
        assert_eq!(
            kp.address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }
}
