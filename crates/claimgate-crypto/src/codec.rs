use claimgate_core::authorization::{AdminAction, AdminCommand, ClaimAuthorization};
use claimgate_core::constants::{
    ADDRESS_LENGTH, ADMIN_DOMAIN_TAG, PACKED_ADMIN_COMMAND_LENGTH, PACKED_AUTHORIZATION_LENGTH, WORD_LENGTH,
};
use claimgate_core::types::{MessageHash, Timestamp};
use sha3::{Digest, Keccak256};

/// Compute Keccak-256 of arbitrary bytes → 32-byte array.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Packed encoding of an authorization, byte-for-byte what the issuer hashes:
///
/// ```text
/// recipient (20) ‖ total_amount (32, BE) ‖ nonce (32, BE) ‖ deadline (32, BE)
/// ```
///
/// Integers are left-padded to 256 bits. The deadline is sign-extended, which
/// is the plain unsigned encoding for every non-negative timestamp.
pub fn encode_packed(auth: &ClaimAuthorization) -> [u8; PACKED_AUTHORIZATION_LENGTH] {
    let mut out = [0u8; PACKED_AUTHORIZATION_LENGTH];
    out[..ADDRESS_LENGTH].copy_from_slice(auth.recipient.as_bytes());

    let mut offset = ADDRESS_LENGTH;
    put_word(&mut out[offset..offset + WORD_LENGTH], &auth.total_amount.to_be_bytes(), 0x00);
    offset += WORD_LENGTH;
    put_word(&mut out[offset..offset + WORD_LENGTH], &auth.nonce.to_be_bytes(), 0x00);
    offset += WORD_LENGTH;
    put_word(&mut out[offset..offset + WORD_LENGTH], &auth.deadline.to_be_bytes(), sign_pad(auth.deadline));

    out
}

/// Packed encoding of an owner command:
///
/// ```text
/// "claimgate.admin.v1" ‖ action (1) ‖ argument (32) ‖ nonce (32, BE) ‖ deadline (32, BE)
/// ```
///
/// The argument word carries the new key, the new vesting start or the drain
/// amount, padded the same way as authorization fields.
pub fn encode_admin_command(cmd: &AdminCommand) -> [u8; PACKED_ADMIN_COMMAND_LENGTH] {
    let mut out = [0u8; PACKED_ADMIN_COMMAND_LENGTH];
    let mut offset = ADMIN_DOMAIN_TAG.len();
    out[..offset].copy_from_slice(ADMIN_DOMAIN_TAG);
    out[offset] = cmd.action.tag();
    offset += 1;

    let argument = &mut out[offset..offset + WORD_LENGTH];
    match cmd.action {
        AdminAction::RotateAuthorizer { new_key } => put_word(argument, new_key.as_bytes(), 0x00),
        AdminAction::SetVestingStart { new_start } => {
            put_word(argument, &new_start.to_be_bytes(), sign_pad(new_start))
        }
        AdminAction::EmergencyDrain { amount } => put_word(argument, &amount.to_be_bytes(), 0x00),
    }
    offset += WORD_LENGTH;
    put_word(&mut out[offset..offset + WORD_LENGTH], &cmd.nonce.to_be_bytes(), 0x00);
    offset += WORD_LENGTH;
    put_word(&mut out[offset..offset + WORD_LENGTH], &cmd.deadline.to_be_bytes(), sign_pad(cmd.deadline));

    out
}

/// Hash the owner signs to authorize `cmd`.
pub fn hash_admin_command(cmd: &AdminCommand) -> MessageHash {
    MessageHash::from_bytes(keccak256(&encode_admin_command(cmd)))
}

fn sign_pad(value: Timestamp) -> u8 {
    if value < 0 { 0xff } else { 0x00 }
}

/// Canonical hash identifying an authorization.
pub fn hash_authorization(auth: &ClaimAuthorization) -> MessageHash {
    MessageHash::from_bytes(keccak256(&encode_packed(auth)))
}

fn put_word(word: &mut [u8], be: &[u8], pad: u8) {
    let split = word.len() - be.len();
    word[..split].fill(pad);
    word[split..].copy_from_slice(be);
}
