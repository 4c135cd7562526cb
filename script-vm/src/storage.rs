//! State access: the read-only ledger trait, the transactional overlay and
//! the storage record formats.

use script_types::{Address, H256};

use crate::chain::{Block, Header, Transaction};
use crate::consts::STORAGE_ITEM_VERSION;
use crate::error::ExecError;

mod cache;
mod memory;

pub use cache::{CacheDB, WriteSet};
pub use memory::MemoryStore;

/// State key prefix for deployed contract records.
pub const ST_CONTRACT: u8 = 0x05;

/// State key prefix for contract storage entries.
pub const ST_STORAGE: u8 = 0x06;

/// Read-only view of committed chain state.
///
/// Implementations must be safe for concurrent readers; the core never
/// writes through this trait.
pub trait LedgerStore {
    /// Backend failure type.
    type Error: Into<ExecError>;

    /// Raw state entry.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Raw state entries whose keys start with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Self::Error>;

    /// Height of the latest block.
    fn current_height(&self) -> Result<u32, Self::Error>;

    /// Hash of the latest block.
    fn current_block_hash(&self) -> Result<H256, Self::Error>;

    /// Header at `height`, if any.
    fn header_by_height(&self, height: u32) -> Result<Option<Header>, Self::Error>;

    /// Header with the given hash, if any.
    fn header_by_hash(&self, hash: &H256) -> Result<Option<Header>, Self::Error>;

    /// Block at `height`, if any.
    fn block_by_height(&self, height: u32) -> Result<Option<Block>, Self::Error>;

    /// Block with the given hash, if any.
    fn block_by_hash(&self, hash: &H256) -> Result<Option<Block>, Self::Error>;

    /// Transaction with the given hash and the height it was included at.
    fn transaction(&self, hash: &H256) -> Result<Option<(Transaction, u32)>, Self::Error>;
}

/// Capability to read or write the storage area of one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageContext {
    /// Contract whose storage this context addresses.
    pub contract: Address,
    /// Writes are rejected through a read-only context.
    pub read_only: bool,
}

impl StorageContext {
    /// Writable context for `contract`.
    pub const fn new(contract: Address) -> Self {
        Self {
            contract,
            read_only: false,
        }
    }

    /// Read-only context for `contract`.
    pub const fn read_only(contract: Address) -> Self {
        Self {
            contract,
            read_only: true,
        }
    }

    /// Downgrade to read-only; there is no inverse.
    pub const fn as_read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }
}

/// Versioned contract storage value record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageItem {
    /// Stored value bytes.
    pub value: Vec<u8>,
}

impl StorageItem {
    /// Wrap a raw value.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Record layout: version byte, then the value.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.value.len() + 1);
        out.push(STORAGE_ITEM_VERSION);
        out.extend_from_slice(&self.value);
        out
    }

    /// Inverse of [`StorageItem::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, ExecError> {
        match data.split_first() {
            Some((&STORAGE_ITEM_VERSION, value)) => Ok(Self {
                value: value.to_vec(),
            }),
            _ => Err(ExecError::Store("malformed storage item record".into())),
        }
    }
}

/// State key of a deployed contract record.
pub fn contract_key(contract: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + Address::LEN);
    key.push(ST_CONTRACT);
    key.extend_from_slice(contract.as_ref());
    key
}

/// State key of one contract storage entry.
pub fn storage_key(contract: &Address, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + Address::LEN + key.len());
    out.push(ST_STORAGE);
    out.extend_from_slice(contract.as_ref());
    out.extend_from_slice(key);
    out
}

/// Common prefix of every storage entry of `contract`.
pub fn storage_prefix(contract: &Address) -> Vec<u8> {
    storage_key(contract, &[])
}
