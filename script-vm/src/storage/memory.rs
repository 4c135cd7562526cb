use std::collections::BTreeMap;
use std::convert::Infallible;

use script_types::{Address, H256};

use crate::chain::{Block, DeployCode, Header, Transaction};
use crate::storage::{contract_key, LedgerStore};

/// In-memory [`LedgerStore`] used by tests and previews.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: BTreeMap<Vec<u8>, Vec<u8>>,
    headers: BTreeMap<u32, Header>,
    blocks: BTreeMap<u32, Block>,
    transactions: BTreeMap<H256, (Transaction, u32)>,
    height: u32,
    block_hash: H256,
}

impl MemoryStore {
    /// Empty store at height zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw state entry.
    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.state.insert(key, value);
    }

    /// Register a deployed contract record.
    pub fn deploy_contract(&mut self, contract: &Address, deploy: &DeployCode) {
        self.put_raw(contract_key(contract), deploy.to_bytes());
    }

    /// Register a block, its header and its transactions; the store's
    /// current height and hash follow the highest inserted block.
    pub fn insert_block(&mut self, block: Block) {
        let height = block.header.height;

        for tx in &block.transactions {
            self.transactions.insert(tx.hash, (tx.clone(), height));
        }

        self.headers.insert(height, block.header.clone());

        if height >= self.height {
            self.height = height;
            self.block_hash = block.header.hash;
        }

        self.blocks.insert(height, block);
    }

    /// Apply a committed write-set, as produced by a successful execution.
    pub fn apply(&mut self, writes: super::WriteSet) {
        for (key, value) in writes {
            match value {
                Some(value) => self.state.insert(key, value),
                None => self.state.remove(&key),
            };
        }
    }

    fn header_height(&self, hash: &H256) -> Option<u32> {
        self.headers
            .values()
            .find(|h| h.hash == *hash)
            .map(|h| h.height)
    }
}

impl LedgerStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Infallible> {
        Ok(self.state.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Infallible> {
        Ok(self
            .state
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn current_height(&self) -> Result<u32, Infallible> {
        Ok(self.height)
    }

    fn current_block_hash(&self) -> Result<H256, Infallible> {
        Ok(self.block_hash)
    }

    fn header_by_height(&self, height: u32) -> Result<Option<Header>, Infallible> {
        Ok(self.headers.get(&height).cloned())
    }

    fn header_by_hash(&self, hash: &H256) -> Result<Option<Header>, Infallible> {
        Ok(self
            .header_height(hash)
            .and_then(|h| self.headers.get(&h).cloned()))
    }

    fn block_by_height(&self, height: u32) -> Result<Option<Block>, Infallible> {
        Ok(self.blocks.get(&height).cloned())
    }

    fn block_by_hash(&self, hash: &H256) -> Result<Option<Block>, Infallible> {
        Ok(self
            .header_height(hash)
            .and_then(|h| self.blocks.get(&h).cloned()))
    }

    fn transaction(&self, hash: &H256) -> Result<Option<(Transaction, u32)>, Infallible> {
        Ok(self.transactions.get(hash).cloned())
    }
}
