//! Ledger data model visible to contracts.
//!
//! These are collaborator shapes: decoding, signature recovery and block
//! assembly happen outside the core. Only the fields exposed through interop
//! accessors are modeled.

use script_types::bytes::{self, Reader};
use script_types::{Address, H256};

use crate::consts::MAX_BYTEARRAY_SIZE;
use crate::error::ExecError;

/// Block header.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Header format version.
    pub version: u32,
    /// Hash of the previous block.
    pub prev_hash: H256,
    /// Merkle root over the block's transactions.
    pub tx_root: H256,
    /// Unix timestamp of the block.
    pub timestamp: u32,
    /// Height of the block.
    pub height: u32,
    /// Consensus nonce.
    pub consensus_data: u64,
    /// Address authorized to produce the next block.
    pub next_bookkeeper: Address,
    /// Hash of this header.
    pub hash: H256,
}

/// Full block: header plus ordered transactions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The transactions in block order.
    pub transactions: Vec<Transaction>,
}

/// Transaction kind discriminator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TxType {
    /// Contract deployment.
    Deploy = 0xd0,
    /// Contract invocation.
    #[default]
    Invoke = 0xd1,
}

/// Free-form transaction attribute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxAttribute {
    /// Attribute usage tag.
    pub usage: u8,
    /// Attribute payload.
    pub data: Vec<u8>,
}

/// Transaction as seen by the execution core.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// Transaction hash.
    pub hash: H256,
    /// Transaction kind.
    pub tx_type: TxType,
    /// Attached attributes.
    pub attributes: Vec<TxAttribute>,
    /// Addresses recovered from the transaction signatures.
    pub signers: Vec<Address>,
}

impl Transaction {
    /// Addresses whose signatures authorize this transaction.
    pub fn signature_addresses(&self) -> &[Address] {
        &self.signers
    }
}

/// Deployed contract record stored in state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeployCode {
    /// The contract bytecode.
    pub code: Vec<u8>,
    /// Whether the contract may use persistent storage.
    pub need_storage: bool,
    /// Display name.
    pub name: String,
    /// Display version.
    pub version: String,
    /// Author contact.
    pub author: String,
    /// Email contact.
    pub email: String,
    /// Free-form description.
    pub description: String,
}

impl DeployCode {
    /// Canonical byte form, as stored under the contract record key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.code.len() + 64);

        bytes::write_var_bytes(&mut out, &self.code);
        out.push(self.need_storage as u8);
        bytes::write_var_string(&mut out, &self.name);
        bytes::write_var_string(&mut out, &self.version);
        bytes::write_var_string(&mut out, &self.author);
        bytes::write_var_string(&mut out, &self.email);
        bytes::write_var_string(&mut out, &self.description);

        out
    }

    /// Inverse of [`DeployCode::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, ExecError> {
        let mut reader = Reader::new(data);

        let code = reader.read_var_bytes(MAX_BYTEARRAY_SIZE)?.to_vec();
        let need_storage = reader.read_u8()? != 0;
        let name = reader.read_var_string(MAX_BYTEARRAY_SIZE)?;
        let version = reader.read_var_string(MAX_BYTEARRAY_SIZE)?;
        let author = reader.read_var_string(MAX_BYTEARRAY_SIZE)?;
        let email = reader.read_var_string(MAX_BYTEARRAY_SIZE)?;
        let description = reader.read_var_string(MAX_BYTEARRAY_SIZE)?;

        Ok(Self {
            code,
            need_storage,
            name,
            version,
            author,
            email,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_code_round_trip() {
        let deploy = DeployCode {
            code: vec![0x51, 0x52, 0x93],
            need_storage: true,
            name: "token".into(),
            version: "1.0".into(),
            author: "dev".into(),
            email: "dev@example.org".into(),
            description: "sample".into(),
        };

        let decoded = DeployCode::from_bytes(&deploy.to_bytes()).expect("round trip");
        assert_eq!(decoded, deploy);
    }

    #[test]
    fn truncated_deploy_code_fails() {
        let deploy = DeployCode {
            code: vec![0x51],
            ..Default::default()
        };

        let mut data = deploy.to_bytes();
        data.truncate(data.len() - 1);

        assert!(DeployCode::from_bytes(&data).is_err());
    }
}
