//! Tagged value model of the VM.
//!
//! Containers are shared handles: cloning a [`StackItem`] clones the handle,
//! not the payload, so mutations through one copy are visible through every
//! other. Reference equality and cycle detection are both defined over the
//! handle identity.

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::collections::HashSet;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::Zero;

use script_asm::{decode_integer, encode_integer, FaultReason};

use crate::chain::{Block, DeployCode, Header, Transaction, TxAttribute};
use crate::consts::MAX_INT_SIZE;
use crate::storage::StorageContext;

/// Shared, mutable element sequence backing `Array` and `Struct`.
#[derive(Clone, Default)]
pub struct ArrayRef(Rc<RefCell<Vec<StackItem>>>);

impl ArrayRef {
    /// Wrap an element vector.
    pub fn new(items: Vec<StackItem>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Immutable view of the elements.
    pub fn borrow(&self) -> Ref<'_, Vec<StackItem>> {
        self.0.borrow()
    }

    /// Mutable view of the elements.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<StackItem>> {
        self.0.borrow_mut()
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// `true` when there are no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Allocation identity, used for reference equality and cycle checks.
    pub fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Same allocation?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Shared, mutable key-value sequence backing `Map`.
///
/// Entries keep insertion order so iteration is deterministic; keys are
/// restricted to the primitive variants and compared by canonical bytes.
#[derive(Clone, Default)]
pub struct MapRef(Rc<RefCell<Vec<(StackItem, StackItem)>>>);

impl MapRef {
    /// New empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable view of the entries.
    pub fn borrow(&self) -> Ref<'_, Vec<(StackItem, StackItem)>> {
        self.0.borrow()
    }

    /// Entry count.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Look up a value by canonical key equality.
    pub fn get(&self, key: &StackItem) -> Result<Option<StackItem>, FaultReason> {
        let key = key.map_key_bytes()?;

        for (k, v) in self.0.borrow().iter() {
            if k.map_key_bytes()? == key {
                return Ok(Some(v.clone()));
            }
        }

        Ok(None)
    }

    /// Insert or replace an entry, preserving first-insertion order.
    pub fn insert(&self, key: StackItem, value: StackItem) -> Result<(), FaultReason> {
        let needle = key.map_key_bytes()?;

        let mut entries = self.0.borrow_mut();
        for (k, v) in entries.iter_mut() {
            if k.map_key_bytes()? == needle {
                *v = value;
                return Ok(());
            }
        }

        entries.push((key, value));
        Ok(())
    }

    /// Remove an entry; `true` when it existed.
    pub fn remove(&self, key: &StackItem) -> Result<bool, FaultReason> {
        let needle = key.map_key_bytes()?;

        let mut entries = self.0.borrow_mut();
        let before = entries.len();
        let mut result = Ok(());
        entries.retain(|(k, _)| match k.map_key_bytes() {
            Ok(bytes) => bytes != needle,
            Err(e) => {
                result = Err(e);
                true
            }
        });
        result?;

        Ok(entries.len() != before)
    }

    /// `true` when the key is present.
    pub fn contains(&self, key: &StackItem) -> Result<bool, FaultReason> {
        Ok(self.get(key)?.is_some())
    }

    /// Allocation identity, used for reference equality and cycle checks.
    pub fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Same allocation?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Host-side value carried through the stack as an opaque handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteropValue {
    /// Capability to a contract's storage area.
    StorageContext(StorageContext),
    /// Block header.
    Header(Header),
    /// Full block.
    Block(Block),
    /// Transaction.
    Transaction(Transaction),
    /// Transaction attribute.
    Attribute(TxAttribute),
    /// Deployed contract record.
    Contract(DeployCode),
}

/// Shared handle to an [`InteropValue`].
#[derive(Clone)]
pub struct InteropRef(Rc<InteropValue>);

impl InteropRef {
    /// Wrap a host value.
    pub fn new(value: InteropValue) -> Self {
        Self(Rc::new(value))
    }

    /// The wrapped host value.
    pub fn value(&self) -> &InteropValue {
        &self.0
    }

    /// Same allocation?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InteropRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InteropRef({:?})", self.0)
    }
}

/// One VM value.
#[derive(Clone)]
pub enum StackItem {
    /// Arbitrary-precision signed integer.
    Integer(BigInt),
    /// Immutable byte string.
    ByteString(Vec<u8>),
    /// Boolean.
    Boolean(bool),
    /// Ordered mutable sequence; equality by reference.
    Array(ArrayRef),
    /// Same shape as `Array`; equality is deep and structural.
    Struct(ArrayRef),
    /// Insertion-ordered key-value mapping; equality by reference.
    Map(MapRef),
    /// Opaque host value; equality by reference.
    Interop(InteropRef),
}

impl StackItem {
    /// Build an array item from its elements.
    pub fn array(items: Vec<StackItem>) -> Self {
        Self::Array(ArrayRef::new(items))
    }

    /// Build a struct item from its elements.
    pub fn structure(items: Vec<StackItem>) -> Self {
        Self::Struct(ArrayRef::new(items))
    }

    /// Build an empty map item.
    pub fn map() -> Self {
        Self::Map(MapRef::new())
    }

    /// Wrap a host value.
    pub fn interop(value: InteropValue) -> Self {
        Self::Interop(InteropRef::new(value))
    }

    /// Human-readable variant name, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "Integer",
            Self::ByteString(_) => "ByteString",
            Self::Boolean(_) => "Boolean",
            Self::Array(_) => "Array",
            Self::Struct(_) => "Struct",
            Self::Map(_) => "Map",
            Self::Interop(_) => "Interop",
        }
    }

    /// Canonical byte form of a primitive item.
    pub fn as_bytes(&self) -> Result<Vec<u8>, FaultReason> {
        match self {
            Self::Integer(n) => Ok(encode_integer(n)),
            Self::ByteString(b) => Ok(b.clone()),
            Self::Boolean(true) => Ok(vec![0x01]),
            Self::Boolean(false) => Ok(Vec::new()),
            _ => Err(FaultReason::TypeMismatch),
        }
    }

    /// Numeric value of a primitive item.
    ///
    /// Byte strings longer than the integer limit do not convert.
    pub fn as_integer(&self) -> Result<BigInt, FaultReason> {
        match self {
            Self::Integer(n) => {
                check_integer(n)?;
                Ok(n.clone())
            }
            Self::ByteString(b) => {
                if b.len() > MAX_INT_SIZE {
                    return Err(FaultReason::IntegerOverflow);
                }
                Ok(decode_integer(b))
            }
            Self::Boolean(b) => Ok(BigInt::from(*b as u8)),
            _ => Err(FaultReason::TypeMismatch),
        }
    }

    /// Truth value of any item; containers and handles are always true.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Integer(n) => !n.is_zero(),
            Self::ByteString(b) => b.iter().any(|b| *b != 0),
            Self::Boolean(b) => *b,
            Self::Array(_) | Self::Struct(_) | Self::Map(_) | Self::Interop(_) => true,
        }
    }

    /// Element sequence of an array or struct.
    pub fn as_sequence(&self) -> Result<&ArrayRef, FaultReason> {
        match self {
            Self::Array(a) | Self::Struct(a) => Ok(a),
            _ => Err(FaultReason::TypeMismatch),
        }
    }

    /// The map handle.
    pub fn as_map(&self) -> Result<&MapRef, FaultReason> {
        match self {
            Self::Map(m) => Ok(m),
            _ => Err(FaultReason::TypeMismatch),
        }
    }

    /// The interop handle.
    pub fn as_interop(&self) -> Result<&InteropRef, FaultReason> {
        match self {
            Self::Interop(i) => Ok(i),
            _ => Err(FaultReason::TypeMismatch),
        }
    }

    /// Canonical bytes of a map key; containers and handles are not keys.
    pub fn map_key_bytes(&self) -> Result<Vec<u8>, FaultReason> {
        match self {
            Self::Integer(_) | Self::ByteString(_) | Self::Boolean(_) => self.as_bytes(),
            _ => Err(FaultReason::InvalidMapKey),
        }
    }

    /// Item equality.
    ///
    /// Primitives compare by canonical bytes; arrays, maps and handles by
    /// allocation identity; structs element-wise. Cyclic structs fault.
    pub fn equals(&self, other: &StackItem) -> Result<bool, FaultReason> {
        let mut visiting = HashSet::new();
        equals_inner(self, other, &mut visiting)
    }

    /// Full recursive copy; cyclic containers fault.
    pub fn deep_copy(&self) -> Result<StackItem, FaultReason> {
        let mut visiting = HashSet::new();
        deep_copy_inner(self, &mut visiting)
    }

    /// Value-semantics copy used for struct assignment: nested structs are
    /// copied, every other variant is shared.
    pub fn clone_for_assignment(&self) -> Result<StackItem, FaultReason> {
        match self {
            Self::Struct(_) => self.deep_copy(),
            other => Ok(other.clone()),
        }
    }
}

/// Fault unless the encoded magnitude fits the integer limit.
pub fn check_integer(value: &BigInt) -> Result<(), FaultReason> {
    if encode_integer(value).len() > MAX_INT_SIZE {
        return Err(FaultReason::IntegerOverflow);
    }

    Ok(())
}

fn equals_inner(
    a: &StackItem,
    b: &StackItem,
    visiting: &mut HashSet<(usize, usize)>,
) -> Result<bool, FaultReason> {
    use StackItem::*;

    match (a, b) {
        (Integer(_) | ByteString(_) | Boolean(_), Integer(_) | ByteString(_) | Boolean(_)) => {
            Ok(a.as_bytes()? == b.as_bytes()?)
        }
        (Array(x), Array(y)) => Ok(x.ptr_eq(y)),
        (Map(x), Map(y)) => Ok(x.ptr_eq(y)),
        (Interop(x), Interop(y)) => Ok(x.ptr_eq(y)),
        (Struct(x), Struct(y)) => {
            if x.ptr_eq(y) {
                return Ok(true);
            }

            if !visiting.insert((x.ptr_id(), y.ptr_id())) {
                return Err(FaultReason::CyclicReference);
            }

            let (xs, ys) = (x.borrow(), y.borrow());
            if xs.len() != ys.len() {
                return Ok(false);
            }

            for (xi, yi) in xs.iter().zip(ys.iter()) {
                if !equals_inner(xi, yi, visiting)? {
                    return Ok(false);
                }
            }

            visiting.remove(&(x.ptr_id(), y.ptr_id()));

            Ok(true)
        }
        _ => Ok(false),
    }
}

fn deep_copy_inner(
    item: &StackItem,
    visiting: &mut HashSet<usize>,
) -> Result<StackItem, FaultReason> {
    match item {
        StackItem::Array(a) | StackItem::Struct(a) => {
            if !visiting.insert(a.ptr_id()) {
                return Err(FaultReason::CyclicReference);
            }

            let mut items = Vec::with_capacity(a.len());
            for element in a.borrow().iter() {
                items.push(deep_copy_inner(element, visiting)?);
            }

            visiting.remove(&a.ptr_id());

            Ok(match item {
                StackItem::Array(_) => StackItem::array(items),
                _ => StackItem::structure(items),
            })
        }
        StackItem::Map(m) => {
            if !visiting.insert(m.ptr_id()) {
                return Err(FaultReason::CyclicReference);
            }

            let copy = MapRef::new();
            for (k, v) in m.borrow().iter() {
                copy.insert(k.clone(), deep_copy_inner(v, visiting)?)?;
            }

            visiting.remove(&m.ptr_id());

            Ok(StackItem::Map(copy))
        }
        other => Ok(other.clone()),
    }
}

impl fmt::Debug for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // containers may be cyclic, so only one level is printed
        match self {
            Self::Integer(n) => write!(f, "Integer({n})"),
            Self::ByteString(b) => {
                write!(f, "ByteString(0x")?;
                b.iter().try_for_each(|b| write!(f, "{b:02x}"))?;
                write!(f, ")")
            }
            Self::Boolean(b) => write!(f, "Boolean({b})"),
            Self::Array(a) => write!(f, "Array(len={})", a.len()),
            Self::Struct(s) => write!(f, "Struct(len={})", s.len()),
            Self::Map(m) => write!(f, "Map(len={})", m.len()),
            Self::Interop(i) => write!(f, "{i:?}"),
        }
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for StackItem {
    fn from(value: i64) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<u32> for StackItem {
    fn from(value: u32) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<u64> for StackItem {
    fn from(value: u64) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteString(value)
    }
}

impl From<&[u8]> for StackItem {
    fn from(value: &[u8]) -> Self {
        Self::ByteString(value.to_vec())
    }
}

impl From<script_types::Address> for StackItem {
    fn from(value: script_types::Address) -> Self {
        Self::ByteString(value.as_ref().to_vec())
    }
}

impl From<script_types::H256> for StackItem {
    fn from(value: script_types::H256) -> Self {
        Self::ByteString(value.as_ref().to_vec())
    }
}
