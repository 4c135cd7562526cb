//! Canonical tagged byte form of stack items.
//!
//! This encoding is consensus surface: `Runtime.Serialize` exposes it to
//! contracts and storage-bound values pass through it. Interop handles never
//! serialize and cycles are rejected.

use std::collections::HashSet;

use thiserror::Error;

use script_asm::{decode_integer, encode_integer};
use script_types::bytes::{self, Reader};

use crate::consts::{MAX_ARRAY_SIZE, MAX_BYTEARRAY_SIZE, MAX_INT_SIZE};
use crate::item::{MapRef, StackItem};

const TAG_BYTESTRING: u8 = 0x00;
const TAG_BOOLEAN: u8 = 0x01;
const TAG_INTEGER: u8 = 0x02;
const TAG_ARRAY: u8 = 0x80;
const TAG_STRUCT: u8 = 0x81;
const TAG_MAP: u8 = 0x82;

/// Failure of [`serialize_item`] or [`deserialize_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SerializeError {
    /// A container reachable from itself cannot be encoded.
    #[error("cyclic item")]
    Cyclic,
    /// Interop handles cannot be encoded.
    #[error("unsupported item type")]
    Unsupported,
    /// The encoded form exceeds the byte-string limit.
    #[error("encoded item too large")]
    TooLarge,
    /// The input is not a well-formed encoding.
    #[error("malformed item encoding")]
    Malformed,
}

/// Encode an item into its canonical byte form.
pub fn serialize_item(item: &StackItem) -> Result<Vec<u8>, SerializeError> {
    let mut out = Vec::new();
    let mut visiting = HashSet::new();

    write_item(item, &mut out, &mut visiting)?;

    if out.len() > MAX_BYTEARRAY_SIZE {
        return Err(SerializeError::TooLarge);
    }

    Ok(out)
}

/// Decode the canonical byte form back into an item.
pub fn deserialize_item(data: &[u8]) -> Result<StackItem, SerializeError> {
    let mut reader = Reader::new(data);
    read_item(&mut reader)
}

fn write_item(
    item: &StackItem,
    out: &mut Vec<u8>,
    visiting: &mut HashSet<usize>,
) -> Result<(), SerializeError> {
    match item {
        StackItem::ByteString(data) => {
            if data.len() > MAX_BYTEARRAY_SIZE {
                return Err(SerializeError::TooLarge);
            }

            out.push(TAG_BYTESTRING);
            bytes::write_var_bytes(out, data);
        }
        StackItem::Boolean(value) => {
            out.push(TAG_BOOLEAN);
            out.push(*value as u8);
        }
        StackItem::Integer(value) => {
            out.push(TAG_INTEGER);
            bytes::write_var_bytes(out, &encode_integer(value));
        }
        StackItem::Array(sequence) | StackItem::Struct(sequence) => {
            if !visiting.insert(sequence.ptr_id()) {
                return Err(SerializeError::Cyclic);
            }

            out.push(match item {
                StackItem::Array(_) => TAG_ARRAY,
                _ => TAG_STRUCT,
            });

            let items = sequence.borrow();
            bytes::write_var_uint(out, items.len() as u64);
            for element in items.iter() {
                write_item(element, out, visiting)?;
            }

            visiting.remove(&sequence.ptr_id());
        }
        StackItem::Map(map) => {
            if !visiting.insert(map.ptr_id()) {
                return Err(SerializeError::Cyclic);
            }

            out.push(TAG_MAP);

            let entries = map.borrow();
            bytes::write_var_uint(out, entries.len() as u64);
            for (key, value) in entries.iter() {
                write_item(key, out, visiting)?;
                write_item(value, out, visiting)?;
            }

            visiting.remove(&map.ptr_id());
        }
        StackItem::Interop(_) => return Err(SerializeError::Unsupported),
    }

    Ok(())
}

fn read_item(reader: &mut Reader<'_>) -> Result<StackItem, SerializeError> {
    let tag = reader.read_u8().map_err(|_| SerializeError::Malformed)?;

    match tag {
        TAG_BYTESTRING => {
            let data = reader
                .read_var_bytes(MAX_BYTEARRAY_SIZE)
                .map_err(|_| SerializeError::Malformed)?;
            Ok(StackItem::ByteString(data.to_vec()))
        }
        TAG_BOOLEAN => {
            let value = reader.read_u8().map_err(|_| SerializeError::Malformed)?;
            Ok(StackItem::Boolean(value != 0))
        }
        TAG_INTEGER => {
            let data = reader
                .read_var_bytes(MAX_INT_SIZE)
                .map_err(|_| SerializeError::Malformed)?;
            Ok(StackItem::Integer(decode_integer(data)))
        }
        TAG_ARRAY | TAG_STRUCT => {
            let count = reader
                .read_var_uint(MAX_ARRAY_SIZE as u64)
                .map_err(|_| SerializeError::Malformed)? as usize;

            let mut items = Vec::with_capacity(count.min(MAX_ARRAY_SIZE));
            for _ in 0..count {
                items.push(read_item(reader)?);
            }

            Ok(match tag {
                TAG_ARRAY => StackItem::array(items),
                _ => StackItem::structure(items),
            })
        }
        TAG_MAP => {
            let count = reader
                .read_var_uint(MAX_ARRAY_SIZE as u64)
                .map_err(|_| SerializeError::Malformed)? as usize;

            let map = MapRef::new();
            for _ in 0..count {
                let key = read_item(reader)?;
                let value = read_item(reader)?;
                map.insert(key, value)
                    .map_err(|_| SerializeError::Malformed)?;
            }

            Ok(StackItem::Map(map))
        }
        _ => Err(SerializeError::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::item::ArrayRef;

    #[test]
    fn primitive_round_trips() {
        for item in [
            StackItem::from(0i64),
            StackItem::from(-128i64),
            StackItem::from(true),
            StackItem::from(false),
            StackItem::from(b"bytes".as_slice()),
            StackItem::from(Vec::new()),
        ] {
            let bytes = serialize_item(&item).expect("serializable");
            let back = deserialize_item(&bytes).expect("deserializable");
            assert!(item.equals(&back).unwrap());
        }
    }

    #[test]
    fn nested_containers_round_trip() {
        let map = MapRef::new();
        map.insert(StackItem::from(1i64), StackItem::from(b"one".as_slice()))
            .unwrap();
        map.insert(StackItem::from(b"k".as_slice()), StackItem::from(false))
            .unwrap();

        let item = StackItem::array(vec![
            StackItem::from(42i64),
            StackItem::structure(vec![StackItem::from(true)]),
            StackItem::Map(map),
        ]);

        let bytes = serialize_item(&item).expect("serializable");
        let reencoded = serialize_item(&deserialize_item(&bytes).unwrap()).unwrap();

        assert_eq!(bytes, reencoded);
    }

    #[test]
    fn cyclic_array_is_rejected() {
        let inner = ArrayRef::new(vec![]);
        inner.borrow_mut().push(StackItem::Array(inner.clone()));

        assert_eq!(
            serialize_item(&StackItem::Array(inner)),
            Err(SerializeError::Cyclic)
        );
    }

    #[test]
    fn shared_subtree_is_not_a_cycle() {
        let shared = StackItem::array(vec![StackItem::from(1i64)]);
        let item = StackItem::array(vec![shared.clone(), shared]);

        assert!(serialize_item(&item).is_ok());
    }

    #[test]
    fn interop_is_rejected() {
        use crate::item::InteropValue;
        use crate::storage::StorageContext;

        let item = StackItem::interop(InteropValue::StorageContext(StorageContext::new(
            script_types::Address::zeroed(),
        )));

        assert_eq!(serialize_item(&item), Err(SerializeError::Unsupported));
    }

    fn item_strategy() -> impl Strategy<Value = StackItem> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(StackItem::from),
            any::<bool>().prop_map(StackItem::from),
            prop::collection::vec(any::<u8>(), 0..48).prop_map(StackItem::from),
        ];

        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(StackItem::array),
                prop::collection::vec(inner, 0..4).prop_map(StackItem::structure),
            ]
        })
    }

    proptest! {
        #[test]
        fn round_trip_is_stable(item in item_strategy()) {
            let bytes = serialize_item(&item).expect("acyclic item");
            let back = deserialize_item(&bytes).expect("well-formed");
            prop_assert_eq!(bytes, serialize_item(&back).expect("still serializable"));
        }
    }
}
