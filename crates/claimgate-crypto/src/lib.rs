//! claimgate-crypto
//!
//! Canonical authorization hashing and secp256k1 signature recovery.
//! Everything here is pure: no state is read or written.

pub mod codec;
pub mod keypair;
pub mod signature;

pub use codec::{encode_admin_command, encode_packed, hash_admin_command, hash_authorization, keccak256};
pub use keypair::AuthorizerKeyPair;
pub use signature::{address_from_key, prefixed_digest, recover_signer, verify, SignatureError};
