//! Bounded recent-turn window.
//!
//! A FIFO buffer of `Turn`s with a fixed capacity. Appending past capacity
//! drops from the head; compaction removes an exact count from the head and
//! refuses to remove more than is present.

use std::collections::VecDeque;

use super::types::Turn;
use super::MemoryError;

/// Default number of turns kept before the oldest are evicted
pub const DEFAULT_CAPACITY: usize = 50;

/// Fixed-capacity, oldest-first sequence of turns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBuffer {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer holding at most `capacity` turns (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a buffer from stored turns, keeping only the newest `capacity`.
    pub fn from_turns(turns: impl IntoIterator<Item = Turn>, capacity: usize) -> Self {
        let mut buffer = Self::with_capacity(capacity);
        for turn in turns {
            buffer.append(turn);
        }
        buffer
    }

    /// Add a turn at the tail, evicting from the head while over capacity.
    ///
    /// Returns the number of turns evicted.
    pub fn append(&mut self, turn: Turn) -> usize {
        self.turns.push_back(turn);
        let mut evicted = 0;
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Remove exactly `n` turns from the head, returning them oldest first.
    ///
    /// # Errors
    /// `MemoryError::InsufficientHistory` if fewer than `n` turns are held; the
    /// buffer is left untouched in that case.
    pub fn evict_oldest(&mut self, n: usize) -> Result<Vec<Turn>, MemoryError> {
        if n > self.turns.len() {
            return Err(MemoryError::InsufficientHistory {
                requested: n,
                available: self.turns.len(),
            });
        }
        Ok(self.turns.drain(..n).collect())
    }

    /// The oldest `n` turns (or fewer), without removing them
    pub fn oldest(&self, n: usize) -> Vec<Turn> {
        self.turns.iter().take(n).cloned().collect()
    }

    /// The most recent `last_n` turns (or fewer), in chronological order
    pub fn snapshot(&self, last_n: usize) -> Vec<Turn> {
        let skip = self.turns.len().saturating_sub(last_n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
