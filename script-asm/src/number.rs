use num_bigint::BigInt;
use num_traits::Zero;

/// Canonical byte encoding of a VM integer.
///
/// Minimal-length little-endian two's complement; zero encodes to the empty
/// string, and a positive value whose top bit would read as a sign gains a
/// trailing `0x00`.
pub fn encode_integer(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }

    value.to_signed_bytes_le()
}

/// Inverse of [`encode_integer`]; the empty string decodes to zero.
pub fn decode_integer(bytes: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_le(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_case::test_case;

    #[test_case(0 => Vec::<u8>::new())]
    #[test_case(1 => vec![0x01])]
    #[test_case(-1 => vec![0xff])]
    #[test_case(127 => vec![0x7f])]
    #[test_case(128 => vec![0x80, 0x00]; "sign extension byte")]
    #[test_case(-128 => vec![0x80])]
    #[test_case(256 => vec![0x00, 0x01])]
    #[test_case(-256 => vec![0x00, 0xff])]
    fn canonical_vectors(value: i64) -> Vec<u8> {
        encode_integer(&BigInt::from(value))
    }

    #[test]
    fn round_trip() {
        for value in [0i64, 1, -1, 127, 128, -128, 255, 256, i64::MAX, i64::MIN] {
            let n = BigInt::from(value);
            assert_eq!(decode_integer(&encode_integer(&n)), n);
        }
    }
}
