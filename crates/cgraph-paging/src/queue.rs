//! Duplicate-free FIFO of identifiers waiting to be resolved.
//!
//! Pure synchronous state: no I/O, no locking. The owning pipeline is
//! responsible for synchronization.

use std::collections::{HashSet, VecDeque};

use cgraph_core::Identifier;

/// Ordered queue that accepts each identifier at most once.
///
/// Every id ever pushed is remembered in `seen`, including ids that have
/// since been popped, so a source that repeats itself across pages cannot
/// reintroduce an id.
#[derive(Debug, Default)]
pub struct DeduplicatingIdQueue {
    pending: VecDeque<Identifier>,
    seen: HashSet<Identifier>,
}

impl DeduplicatingIdQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unseen ids in order. Returns how many were accepted.
    pub fn push<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut accepted = 0;
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.pending.push_back(id);
                accepted += 1;
            }
        }
        accepted
    }

    /// Remove and return up to `n` ids from the front.
    pub fn pop_first(&mut self, n: usize) -> Vec<Identifier> {
        let n = n.min(self.pending.len());
        self.pending.drain(..n).collect()
    }

    /// The ids [`pop_first`](Self::pop_first) would return, without removing them.
    pub fn peek_first(&self, n: usize) -> Vec<Identifier> {
        self.pending.iter().take(n).cloned().collect()
    }

    /// Whether `id` was ever accepted.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.seen.contains(id)
    }

    pub const fn seen(&self) -> &HashSet<Identifier> {
        &self.seen
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
