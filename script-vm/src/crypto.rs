//! Hashing and signature primitives used by opcodes and interop services.

use std::sync::OnceLock;

use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, VerifyOnly};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use script_asm::FaultReason;
use script_types::{Address, H256};

fn secp() -> &'static Secp256k1<VerifyOnly> {
    static CONTEXT: OnceLock<Secp256k1<VerifyOnly>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::verification_only)
}

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-1 digest.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Double SHA-256 digest.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 over SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Contract address of a script: its 160-bit code hash.
pub fn address_from_code(code: &[u8]) -> Address {
    Address::new(hash160(code))
}

/// Account address of a serialized public key.
pub fn address_from_pubkey(key: &[u8]) -> Result<Address, FaultReason> {
    PublicKey::from_slice(key).map_err(|_| FaultReason::InvalidPublicKey)?;
    Ok(Address::new(hash160(key)))
}

/// Double-SHA-256 transaction hash.
pub fn transaction_hash(raw: &[u8]) -> H256 {
    H256::new(hash256(raw))
}

/// Verify an ECDSA signature over `data`.
///
/// A malformed public key is an error; a bad or malformed signature is a
/// plain `false` so contracts can branch on the outcome.
pub fn verify_signature(
    pubkey: &[u8],
    signature: &[u8],
    data: &[u8],
) -> Result<bool, FaultReason> {
    let key = PublicKey::from_slice(pubkey).map_err(|_| FaultReason::InvalidPublicKey)?;

    let Ok(sig) = Signature::from_compact(signature) else {
        return Ok(false);
    };

    let message = Message::from_digest(sha256(data));

    Ok(secp().verify_ecdsa(&message, &sig, &key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use secp256k1::SecretKey;

    fn keypair(seed: u64) -> (SecretKey, PublicKey) {
        let rng = &mut StdRng::seed_from_u64(seed);
        let secp = Secp256k1::new();
        secp.generate_keypair(rng)
    }

    fn sign(key: &SecretKey, data: &[u8]) -> Vec<u8> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(sha256(data));
        secp.sign_ecdsa(&message, key)
            .serialize_compact()
            .to_vec()
    }

    #[test]
    fn valid_signature_verifies() {
        let (sk, pk) = keypair(8);
        let sig = sign(&sk, b"payload");

        let ok = verify_signature(&pk.serialize(), &sig, b"payload").expect("valid key");
        assert!(ok);
    }

    #[test]
    fn wrong_message_is_false_not_error() {
        let (sk, pk) = keypair(8);
        let sig = sign(&sk, b"payload");

        let ok = verify_signature(&pk.serialize(), &sig, b"other").expect("valid key");
        assert!(!ok);
    }

    #[test]
    fn malformed_pubkey_is_an_error() {
        assert_eq!(
            verify_signature(&[0u8; 33], &[0u8; 64], b"payload"),
            Err(FaultReason::InvalidPublicKey)
        );
    }

    #[test]
    fn known_hash_values() {
        assert_eq!(
            sha256(b"abc"),
            [
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde,
                0x5d, 0xae, 0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c,
                0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
            ]
        );

        // hashing twice and nesting agree
        assert_eq!(hash256(b"abc"), sha256(&sha256(b"abc")));
    }
}
