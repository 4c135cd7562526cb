use std::collections::BTreeMap;

use script_types::Address;

use crate::chain::DeployCode;
use crate::error::ExecError;
use crate::storage::{contract_key, LedgerStore};

/// One overlay layer: key to value, `None` marking a deletion.
pub type WriteSet = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Copy-on-write state overlay above a [`LedgerStore`].
///
/// Reads walk the layer stack top-down before falling through to the store;
/// writes land in the top layer only. `fork` opens a child layer, `commit`
/// folds it into its parent and `discard` drops it, so a failed nested scope
/// never leaks writes.
#[derive(Debug)]
pub struct CacheDB<'a, S> {
    store: &'a S,
    layers: Vec<WriteSet>,
}

impl<'a, S: LedgerStore> CacheDB<'a, S> {
    /// Fresh overlay with a single empty layer.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            layers: vec![WriteSet::new()],
        }
    }

    /// Read a key; overlay layers shadow the store, tombstones read as absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecError> {
        for layer in self.layers.iter().rev() {
            if let Some(entry) = layer.get(key) {
                return Ok(entry.clone());
            }
        }

        self.store.get(key).map_err(Into::into)
    }

    /// Write a key into the active layer.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.active().insert(key, Some(value));
    }

    /// Delete a key: a tombstone in the active layer.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.active().insert(key, None);
    }

    /// Open a child layer; subsequent writes go there until commit/discard.
    pub fn fork(&mut self) {
        self.layers.push(WriteSet::new());
    }

    /// Fold the active layer into its parent. No-op on the base layer.
    pub fn commit(&mut self) {
        if self.layers.len() < 2 {
            return;
        }

        let child = self.layers.pop().expect("len checked");
        self.active().extend(child);
    }

    /// Drop the active layer and its writes. No-op on the base layer.
    pub fn discard(&mut self) {
        if self.layers.len() < 2 {
            return;
        }

        self.layers.pop();
    }

    /// Collapse every layer into one write-set, newest layers winning.
    pub fn into_write_set(mut self) -> WriteSet {
        let mut merged = WriteSet::new();
        for layer in self.layers.drain(..) {
            merged.extend(layer);
        }

        merged
    }

    /// Entries whose keys start with `prefix`, in key order, overlay applied.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ExecError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .store
            .scan_prefix(prefix)
            .map_err(Into::into)?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();

        for layer in &self.layers {
            for (key, value) in layer.range(prefix.to_vec()..) {
                if !key.starts_with(prefix) {
                    break;
                }

                merged.insert(key.clone(), value.clone());
            }
        }

        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }

    /// Deployed contract record for `contract`, if any.
    pub fn get_contract(&self, contract: &Address) -> Result<Option<DeployCode>, ExecError> {
        self.get(&contract_key(contract))?
            .map(|bytes| DeployCode::from_bytes(&bytes))
            .transpose()
    }

    /// Write a deployed contract record.
    pub fn put_contract(&mut self, contract: &Address, deploy: &DeployCode) {
        self.put(contract_key(contract), deploy.to_bytes());
    }

    /// Delete a deployed contract record.
    pub fn delete_contract(&mut self, contract: &Address) {
        self.delete(contract_key(contract));
    }

    fn active(&mut self) -> &mut WriteSet {
        self.layers.last_mut().expect("at least one layer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::MemoryStore;

    #[test]
    fn overlay_shadows_store() {
        let mut store = MemoryStore::new();
        store.put_raw(b"k".to_vec(), b"base".to_vec());

        let mut cache = CacheDB::new(&store);
        assert_eq!(cache.get(b"k").unwrap(), Some(b"base".to_vec()));

        cache.put(b"k".to_vec(), b"new".to_vec());
        assert_eq!(cache.get(b"k").unwrap(), Some(b"new".to_vec()));

        cache.delete(b"k".to_vec());
        assert_eq!(cache.get(b"k").unwrap(), None);
    }

    #[test]
    fn fork_commit_discard() {
        let store = MemoryStore::new();
        let mut cache = CacheDB::new(&store);

        cache.put(b"a".to_vec(), vec![1]);

        cache.fork();
        cache.put(b"b".to_vec(), vec![2]);
        assert_eq!(cache.get(b"a").unwrap(), Some(vec![1]));
        cache.discard();
        assert_eq!(cache.get(b"b").unwrap(), None);

        cache.fork();
        cache.put(b"c".to_vec(), vec![3]);
        cache.commit();
        assert_eq!(cache.get(b"c").unwrap(), Some(vec![3]));

        let writes = cache.into_write_set();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[b"c".as_slice()], Some(vec![3]));
    }

    #[test]
    fn base_layer_discard_is_a_no_op() {
        let store = MemoryStore::new();
        let mut cache = CacheDB::new(&store);

        cache.put(b"a".to_vec(), vec![1]);
        cache.discard();

        assert_eq!(cache.get(b"a").unwrap(), Some(vec![1]));
    }

    #[test]
    fn scan_prefix_merges_layers_deterministically() {
        let mut store = MemoryStore::new();
        store.put_raw(b"p1".to_vec(), b"s".to_vec());
        store.put_raw(b"p3".to_vec(), b"s".to_vec());
        store.put_raw(b"q9".to_vec(), b"other".to_vec());

        let mut cache = CacheDB::new(&store);
        cache.put(b"p2".to_vec(), b"o".to_vec());
        cache.delete(b"p3".to_vec());

        let entries = cache.scan_prefix(b"p").unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();

        assert_eq!(keys, vec![b"p1".to_vec(), b"p2".to_vec()]);
    }
}
