//! Identity key codec shared with the identity native contract.
//!
//! A textual identity is stored under
//! `identity-contract-address || len(id) || id`, with the length in one
//! byte; identities are between 1 and 255 bytes.

use script_asm::FaultReason;
use script_types::Address;

use crate::error::ExecError;

/// Address of the identity native contract.
pub const IDENTITY_CONTRACT_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x03,
]);

/// Encode an identity into its state-key form.
pub fn encode_identity_key(id: &[u8]) -> Result<Vec<u8>, ExecError> {
    if id.is_empty() || id.len() > u8::MAX as usize {
        return Err(FaultReason::InvalidOperand.into());
    }

    let mut key = Vec::with_capacity(Address::LEN + 1 + id.len());
    key.extend_from_slice(IDENTITY_CONTRACT_ADDRESS.as_ref());
    key.push(id.len() as u8);
    key.extend_from_slice(id);

    Ok(key)
}

/// Inverse of [`encode_identity_key`].
pub fn decode_identity_key(data: &[u8]) -> Result<&[u8], ExecError> {
    let prefix = Address::LEN;

    if data.len() < prefix + 1 {
        return Err(FaultReason::InvalidOperand.into());
    }

    if !data.starts_with(IDENTITY_CONTRACT_ADDRESS.as_ref()) {
        return Err(FaultReason::InvalidOperand.into());
    }

    let len = data[prefix] as usize;
    if data.len() != prefix + 1 + len || len == 0 {
        return Err(FaultReason::InvalidOperand.into());
    }

    Ok(&data[prefix + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = encode_identity_key(b"did:example:123").unwrap();
        assert_eq!(decode_identity_key(&key).unwrap(), b"did:example:123");
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(encode_identity_key(&[]).is_err());
        assert!(encode_identity_key(&[0u8; 256]).is_err());
    }

    #[test]
    fn rejects_bad_length_byte() {
        let mut key = encode_identity_key(b"id").unwrap();
        key.push(0xaa);
        assert!(decode_identity_key(&key).is_err());
    }
}
