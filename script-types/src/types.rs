use core::{array::TryFromSliceError, borrow::Borrow, fmt, ops::Deref, str};

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

use crate::ADDRESS_VERSION;

macro_rules! key {
    ($i:ident, $s:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $i([u8; $s]);

        impl $i {
            /// Memory length of the type.
            pub const LEN: usize = $s;

            /// Bytes constructor.
            pub const fn new(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }

            /// Zeroes bytes constructor.
            pub const fn zeroed() -> $i {
                $i([0; $s])
            }

            /// Expose the internal bytes.
            pub const fn as_bytes(&self) -> &[u8; $s] {
                &self.0
            }

            /// Convert into the internal bytes.
            pub const fn into_bytes(self) -> [u8; $s] {
                self.0
            }
        }

        impl Deref for $i {
            type Target = [u8; $s];

            fn deref(&self) -> &[u8; $s] {
                &self.0
            }
        }

        impl AsRef<[u8]> for $i {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Borrow<[u8; $s]> for $i {
            fn borrow(&self) -> &[u8; $s] {
                &self.0
            }
        }

        impl From<[u8; $s]> for $i {
            fn from(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }
        }

        impl From<$i> for [u8; $s] {
            fn from(salt: $i) -> [u8; $s] {
                salt.0
            }
        }

        impl TryFrom<&[u8]> for $i {
            type Error = TryFromSliceError;

            fn try_from(bytes: &[u8]) -> Result<Self, TryFromSliceError> {
                <[u8; $s]>::try_from(bytes).map(Self)
            }
        }

        impl fmt::LowerHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }

                self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
        }

        impl fmt::UpperHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }

                self.0.iter().try_for_each(|b| write!(f, "{:02X}", b))
            }
        }

        impl fmt::Debug for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($i), "({:x})"), self)
            }
        }

        impl fmt::Display for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::LowerHex::fmt(self, f)
            }
        }

        #[cfg(feature = "random")]
        impl Distribution<$i> for Standard {
            fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> $i {
                $i(rng.gen())
            }
        }
    };
}

key!(Address, 20, "Contract or account identifier derived from a script hash.");
key!(H256, 32, "256-bit hash value.");

/// Failure to parse an [`Address`] from its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressParseError {
    /// The string is not valid Base58Check.
    InvalidBase58,
    /// The version byte is not [`ADDRESS_VERSION`].
    InvalidVersion,
    /// The decoded payload is not 20 bytes.
    InvalidLength,
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase58 => write!(f, "invalid base58check string"),
            Self::InvalidVersion => write!(f, "invalid address version byte"),
            Self::InvalidLength => write!(f, "invalid address payload length"),
        }
    }
}

impl std::error::Error for AddressParseError {}

impl Address {
    /// Base58Check textual form, version byte [`ADDRESS_VERSION`].
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0)
            .with_check_version(ADDRESS_VERSION)
            .into_string()
    }

    /// Parse the Base58Check textual form produced by [`Address::to_base58`].
    pub fn from_base58(s: &str) -> Result<Self, AddressParseError> {
        let data = bs58::decode(s)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|_| AddressParseError::InvalidBase58)?;

        // `with_check` keeps the version byte in front of the payload
        Self::try_from(&data[1..]).map_err(|_| AddressParseError::InvalidLength)
    }
}

impl str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}
