use crate::traits::SpeciesFactory;
use std::collections::VecDeque;

/// Auto-incrementing integer species: 1, 2, 3, ...
///
/// Never exhausts in practice; `u64::MAX` is the last identity handed out.
#[derive(Debug, Clone, Default)]
pub struct SequentialFactory {
    last: u64,
}

impl SequentialFactory {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Start after `last`, so the first identity is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Most recent identity handed out (0 if none yet).
    pub fn last(&self) -> u64 {
        self.last
    }
}

impl SpeciesFactory<u64> for SequentialFactory {
    fn create(&mut self) -> Option<u64> {
        self.last = self.last.checked_add(1)?;
        Some(self.last)
    }
}

/// Finite factory that hands out a fixed list of identities in order.
///
/// The list must not repeat itself; uniqueness is the caller's promise, the
/// sampler only detects violations.
#[derive(Debug, Clone)]
pub struct ListFactory<T> {
    pending: VecDeque<T>,
}

impl<T> ListFactory<T> {
    pub fn new<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self {
            pending: items.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> SpeciesFactory<T> for ListFactory<T> {
    fn create(&mut self) -> Option<T> {
        self.pending.pop_front()
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.pending.len())
    }
}
