//! Random-access operand stack.
//!
//! Positions count from the top: `peek(0)` is the most recently pushed item.

use script_asm::FaultReason;

use crate::item::StackItem;

/// Evaluation or alt stack of one engine.
#[derive(Debug, Default, Clone)]
pub struct EvaluationStack {
    items: Vec<StackItem>,
}

impl EvaluationStack {
    /// New empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack seeded with `items`; the last element is the top.
    pub fn with_items(items: Vec<StackItem>) -> Self {
        Self { items }
    }

    /// Item count.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Push an item on top.
    pub fn push(&mut self, item: StackItem) {
        self.items.push(item);
    }

    /// Pop the top item.
    pub fn pop(&mut self) -> Result<StackItem, FaultReason> {
        self.items.pop().ok_or(FaultReason::StackUnderflow)
    }

    /// Reference to the item `n` back from the top.
    pub fn peek(&self, n: usize) -> Result<&StackItem, FaultReason> {
        let index = self
            .items
            .len()
            .checked_sub(n + 1)
            .ok_or(FaultReason::StackUnderflow)?;

        Ok(&self.items[index])
    }

    /// Remove and return the item `n` back from the top.
    pub fn remove(&mut self, n: usize) -> Result<StackItem, FaultReason> {
        let index = self
            .items
            .len()
            .checked_sub(n + 1)
            .ok_or(FaultReason::StackUnderflow)?;

        Ok(self.items.remove(index))
    }

    /// Insert an item at position `n` back from the top.
    pub fn insert(&mut self, n: usize, item: StackItem) -> Result<(), FaultReason> {
        let index = self
            .items
            .len()
            .checked_sub(n)
            .ok_or(FaultReason::StackUnderflow)?;

        self.items.insert(index, item);
        Ok(())
    }

    /// Swap the top item with the item `n` back.
    pub fn swap_with_top(&mut self, n: usize) -> Result<(), FaultReason> {
        let top = self.items.len().checked_sub(1).ok_or(FaultReason::StackUnderflow)?;
        let index = self
            .items
            .len()
            .checked_sub(n + 1)
            .ok_or(FaultReason::StackUnderflow)?;

        self.items.swap(top, index);
        Ok(())
    }

    /// Shared-handle copy of the items, bottom first.
    pub fn clone_items(&self) -> Vec<StackItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(values: &[i64]) -> EvaluationStack {
        EvaluationStack::with_items(values.iter().map(|v| StackItem::from(*v)).collect())
    }

    fn as_i64(item: &StackItem) -> i64 {
        i64::try_from(item.as_integer().unwrap()).unwrap()
    }

    #[test]
    fn peek_counts_from_the_top() {
        let s = stack(&[1, 2, 3]);

        assert_eq!(as_i64(s.peek(0).unwrap()), 3);
        assert_eq!(as_i64(s.peek(2).unwrap()), 1);
        assert_eq!(s.peek(3).unwrap_err(), FaultReason::StackUnderflow);
    }

    #[test]
    fn remove_and_insert_are_top_relative() {
        let mut s = stack(&[1, 2, 3]);

        assert_eq!(as_i64(&s.remove(1).unwrap()), 2);
        s.insert(2, StackItem::from(9i64)).unwrap();

        let flat: Vec<_> = s.clone_items().iter().map(as_i64).collect();
        assert_eq!(flat, vec![9, 1, 3]);
    }

    #[test]
    fn swap_with_top() {
        let mut s = stack(&[1, 2, 3]);
        s.swap_with_top(2).unwrap();

        let flat: Vec<_> = s.clone_items().iter().map(as_i64).collect();
        assert_eq!(flat, vec![3, 2, 1]);
    }

    #[test]
    fn pop_empty_underflows() {
        let mut s = EvaluationStack::new();
        assert_eq!(s.pop().unwrap_err(), FaultReason::StackUnderflow);
    }
}
