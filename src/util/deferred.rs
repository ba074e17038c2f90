//! Staged add/remove buffer for collections that are iterated while logic
//! running inside the iteration wants to change them.
//!
//! Owners push keys with [`PendingOps::queue_add`] / [`PendingOps::queue_remove`]
//! at any time and apply them at one fixed point per step with
//! [`PendingOps::drain`]. Adds are always applied before removes, so a key
//! queued for both in the same step ends up absent.

use std::collections::VecDeque;

/// A pending structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp<K> {
    Add(K),
    Remove(K),
}

#[derive(Debug, Clone)]
pub struct PendingOps<K> {
    to_add: VecDeque<K>,
    to_remove: VecDeque<K>,
}

impl<K: PartialEq> PendingOps<K> {
    pub fn new() -> Self {
        Self {
            to_add: VecDeque::new(),
            to_remove: VecDeque::new(),
        }
    }

    pub fn queue_add(&mut self, key: K) {
        self.to_add.push_back(key);
    }

    /// Queue a removal. Queuing the same key twice is a no-op.
    pub fn queue_remove(&mut self, key: K) {
        if !self.to_remove.contains(&key) {
            self.to_remove.push_back(key);
        }
    }

    pub fn is_add_queued(&self, key: &K) -> bool {
        self.to_add.contains(key)
    }

    pub fn is_remove_queued(&self, key: &K) -> bool {
        self.to_remove.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Apply every queued change in order: all adds, then all removes.
    pub fn drain(&mut self, mut apply: impl FnMut(PendingOp<K>)) {
        while let Some(key) = self.to_add.pop_front() {
            apply(PendingOp::Add(key));
        }
        while let Some(key) = self.to_remove.pop_front() {
            apply(PendingOp::Remove(key));
        }
    }
}

impl<K: PartialEq> Default for PendingOps<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_drain_before_removes() {
        let mut ops = PendingOps::new();
        ops.queue_remove(1);
        ops.queue_add(1);
        ops.queue_add(2);

        let mut live = Vec::new();
        ops.drain(|op| match op {
            PendingOp::Add(k) => live.push(k),
            PendingOp::Remove(k) => live.retain(|x| *x != k),
        });

        assert_eq!(live, vec![2]);
        assert!(ops.is_empty());
    }

    #[test]
    fn duplicate_remove_is_queued_once() {
        let mut ops = PendingOps::new();
        ops.queue_remove(7);
        ops.queue_remove(7);

        let mut removed = 0;
        ops.drain(|op| {
            if let PendingOp::Remove(_) = op {
                removed += 1;
            }
        });
        assert_eq!(removed, 1);
    }
}
