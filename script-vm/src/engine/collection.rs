use num_bigint::BigInt;
use num_traits::ToPrimitive;

use script_asm::{FaultReason, OpCode};

use super::ExecutionEngine;
use crate::consts::MAX_ARRAY_SIZE;
use crate::error::ExecError;
use crate::item::StackItem;

impl ExecutionEngine {
    pub(super) fn execute_collection(&mut self, op: OpCode) -> Result<(), ExecError> {
        match op {
            OpCode::ARRAYSIZE => {
                let item = self.pop()?;

                let size = match &item {
                    StackItem::Array(a) | StackItem::Struct(a) => a.len(),
                    StackItem::Map(m) => m.len(),
                    _ => item.as_bytes()?.len(),
                };

                self.push(StackItem::Integer(BigInt::from(size)));
            }
            OpCode::PACK => {
                let count = self.pop_index()?;

                if count > MAX_ARRAY_SIZE {
                    return Err(FaultReason::ArrayTooLarge.into());
                }

                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.pop()?);
                }

                self.push(StackItem::array(items));
            }
            OpCode::UNPACK => {
                let item = self.pop()?;
                let sequence = item.as_sequence()?;

                let items = sequence.borrow().clone();
                for element in items.iter().rev() {
                    self.push(element.clone());
                }

                self.push(StackItem::Integer(BigInt::from(items.len())));
            }
            OpCode::PICKITEM => {
                let key = self.pop()?;
                let collection = self.pop()?;

                let value = match &collection {
                    StackItem::Map(map) => {
                        map.get(&key)?.ok_or(FaultReason::IndexOutOfRange)?
                    }
                    _ => {
                        let sequence = collection.as_sequence()?;
                        let index = sequence_index(&key)?;
                        let items = sequence.borrow();

                        items
                            .get(index)
                            .cloned()
                            .ok_or(FaultReason::IndexOutOfRange)?
                    }
                };

                self.push(value);
            }
            OpCode::SETITEM => {
                let value = self.pop()?.clone_for_assignment()?;
                let key = self.pop()?;
                let collection = self.pop()?;

                match &collection {
                    StackItem::Map(map) => {
                        if map.get(&key)?.is_none() && map.len() >= MAX_ARRAY_SIZE {
                            return Err(FaultReason::ArrayTooLarge.into());
                        }

                        map.insert(key, value)?;
                    }
                    _ => {
                        let sequence = collection.as_sequence()?;
                        let index = sequence_index(&key)?;
                        let mut items = sequence.borrow_mut();

                        let slot = items
                            .get_mut(index)
                            .ok_or(FaultReason::IndexOutOfRange)?;
                        *slot = value;
                    }
                }
            }
            OpCode::NEWARRAY | OpCode::NEWSTRUCT => {
                let count = self.pop_index()?;

                if count > MAX_ARRAY_SIZE {
                    return Err(FaultReason::ArrayTooLarge.into());
                }

                let items = vec![StackItem::Boolean(false); count];
                self.push(match op {
                    OpCode::NEWARRAY => StackItem::array(items),
                    _ => StackItem::structure(items),
                });
            }
            OpCode::NEWMAP => {
                self.push(StackItem::map());
            }
            OpCode::APPEND => {
                let value = self.pop()?.clone_for_assignment()?;
                let collection = self.pop()?;
                let sequence = collection.as_sequence()?;

                if sequence.len() >= MAX_ARRAY_SIZE {
                    return Err(FaultReason::ArrayTooLarge.into());
                }

                sequence.borrow_mut().push(value);
            }
            OpCode::REVERSE => {
                let collection = self.pop()?;
                collection.as_sequence()?.borrow_mut().reverse();
            }
            OpCode::REMOVE => {
                let key = self.pop()?;
                let collection = self.pop()?;

                match &collection {
                    StackItem::Map(map) => {
                        map.remove(&key)?;
                    }
                    _ => {
                        let sequence = collection.as_sequence()?;
                        let index = sequence_index(&key)?;
                        let mut items = sequence.borrow_mut();

                        if index >= items.len() {
                            return Err(FaultReason::IndexOutOfRange.into());
                        }

                        items.remove(index);
                    }
                }
            }
            OpCode::HASKEY => {
                let key = self.pop()?;
                let collection = self.pop()?;

                let found = match &collection {
                    StackItem::Map(map) => map.contains(&key)?,
                    _ => {
                        let sequence = collection.as_sequence()?;
                        sequence_index(&key)? < sequence.len()
                    }
                };

                self.push(StackItem::Boolean(found));
            }
            OpCode::KEYS => {
                let map = self.pop()?;
                let keys: Vec<_> = map
                    .as_map()?
                    .borrow()
                    .iter()
                    .map(|(k, _)| k.clone())
                    .collect();

                self.push(StackItem::array(keys));
            }
            OpCode::VALUES => {
                let collection = self.pop()?;

                let values: Vec<_> = match &collection {
                    StackItem::Map(map) => {
                        map.borrow().iter().map(|(_, v)| v.clone()).collect()
                    }
                    _ => collection.as_sequence()?.borrow().clone(),
                };

                self.push(StackItem::array(values));
            }
            _ => return Err(FaultReason::UnknownOpCode.into()),
        }

        Ok(())
    }
}

fn sequence_index(key: &StackItem) -> Result<usize, FaultReason> {
    key.as_integer()?
        .to_usize()
        .ok_or(FaultReason::IndexOutOfRange)
}
